use async_trait::async_trait;

use super::{SqlBackend, StatementResult};
use crate::core::{Column, Result, Value};
use crate::executor::{
    ExecutionContext, ExecutorPipeline, InsertExecutor, SelectExecutor, UpdateExecutor,
};
use crate::parser::SqlParserAdapter;
use crate::storage::{MemoryStorage, TableSchema};

/// In-process SQL backend: parser → executor pipeline → storage.
///
/// Speaks exactly the statement dialect the writer emits (parameterized
/// INSERT/UPDATE, `ON CONFLICT .. DO UPDATE`, `DEFAULT VALUES`,
/// `RETURNING *`) plus simple SELECTs for reading rows back. Intended
/// for tests and embedded use; production callers wrap their own
/// database client in [`SqlBackend`] instead.
pub struct MemoryBackend {
    parser: SqlParserAdapter,
    storage: MemoryStorage,
    pipeline: ExecutorPipeline,
}

impl MemoryBackend {
    pub fn new() -> Self {
        let mut pipeline = ExecutorPipeline::new();
        pipeline.register(Box::new(InsertExecutor));
        pipeline.register(Box::new(UpdateExecutor));
        pipeline.register(Box::new(SelectExecutor));

        Self {
            parser: SqlParserAdapter::new(),
            storage: MemoryStorage::new(),
            pipeline,
        }
    }

    /// Define a table. The writer itself never emits DDL, so table
    /// creation is a native API rather than parsed SQL.
    pub async fn create_table(&self, name: &str, columns: Vec<Column>) -> Result<()> {
        self.storage
            .create_table(TableSchema::new(name, columns))
            .await
    }

    pub async fn row_count(&self, table: &str) -> Result<usize> {
        self.storage.row_count(table).await
    }

    async fn run(&self, sql: &str, params: &[Value]) -> Result<StatementResult> {
        let stmt = self.parser.parse(sql)?;
        let ctx = ExecutionContext::new(&self.storage, params);
        self.pipeline.dispatch(&stmt, &ctx).await
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SqlBackend for MemoryBackend {
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult> {
        self.run(sql, params).await
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<StatementResult> {
        self.run(sql, params).await
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
