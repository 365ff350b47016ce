use thiserror::Error;

/// Native error of a SQL backend. This is what a failed statement
/// surfaces as before the writer wraps it.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Table '{0}' already exists")]
    TableExists(String),

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Column '{0}' not found in table '{1}'")]
    ColumnNotFound(String, String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// The writer distinguishes exactly one failure kind: the statement did
/// not execute. Validation and lifecycle-hook errors cannot occur here
/// because those subsystems are never invoked.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("statement failed: {0}")]
    StatementFailed(#[from] DbError),
}
