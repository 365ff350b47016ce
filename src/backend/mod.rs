pub mod memory;

use async_trait::async_trait;

use crate::core::{Result, Row, Value};
use crate::writer::sql::quote_ident;

pub use memory::MemoryBackend;

/// Effect of one executed statement: affected-row count, any rows a
/// RETURNING clause produced, and the backend's generated-key channel.
#[derive(Debug, Default)]
pub struct StatementResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub rows_affected: u64,
    /// Key the backend assigned during insert, when the key column was
    /// omitted from the statement.
    pub generated_key: Option<Value>,
}

impl StatementResult {
    pub fn affected(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            ..Self::default()
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Connection seam the writer executes against.
///
/// This trait allows writing code that is agnostic to the actual
/// backend: the bundled [`MemoryBackend`] for tests and simple apps, or
/// a wrapper over a real database client for production use. The only
/// capabilities the writer needs are execute-with-bound-params and a
/// way to read back affected-row counts and generated keys.
#[async_trait]
pub trait SqlBackend: Send + Sync {
    /// Execute a statement that modifies data (INSERT, UPDATE).
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult>;

    /// Execute a statement that is expected to return rows (SELECT).
    async fn query(&self, sql: &str, params: &[Value]) -> Result<StatementResult>;

    /// Canonical zero-column insert for this backend. Issued when every
    /// insertable column was excluded from an insert.
    fn empty_insert_statement(&self, table: &str) -> String {
        format!("INSERT INTO {} DEFAULT VALUES", quote_ident(table))
    }

    /// Check that the connection is alive.
    async fn ping(&self) -> Result<()>;
}
