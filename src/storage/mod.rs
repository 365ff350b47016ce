pub mod table;

pub use table::{Table, TableSchema};

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::core::{DbError, Result};

/// Tables with individual locks; the registry itself is locked only for
/// the short create/lookup operations.
pub struct MemoryStorage {
    tables: RwLock<HashMap<String, Arc<RwLock<Table>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create_table(&self, schema: TableSchema) -> Result<()> {
        let name = schema.name().to_string();
        let mut tables = self.tables.write().await;

        if tables.contains_key(&name) {
            return Err(DbError::TableExists(name));
        }
        tables.insert(name, Arc::new(RwLock::new(Table::new(schema))));
        Ok(())
    }

    /// Handle for concurrent per-table access.
    pub async fn get_table(&self, name: &str) -> Result<Arc<RwLock<Table>>> {
        self.tables
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    pub async fn row_count(&self, table_name: &str) -> Result<usize> {
        let table_handle = self.get_table(table_name).await?;
        let table = table_handle.read().await;
        Ok(table.row_count())
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}
