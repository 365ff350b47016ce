pub mod insert;
pub mod select;
pub mod update;

pub use insert::InsertExecutor;
pub use select::SelectExecutor;
pub use update::UpdateExecutor;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::backend::StatementResult;
use crate::core::{DbError, Result, Value};
use crate::parser::ast::{Expr, Statement};
use crate::storage::MemoryStorage;

pub struct ExecutionContext<'a> {
    pub storage: &'a MemoryStorage,
    /// Positional bind parameters, 1-based from the statement's view.
    pub params: &'a [Value],
}

impl<'a> ExecutionContext<'a> {
    pub fn new(storage: &'a MemoryStorage, params: &'a [Value]) -> Self {
        Self { storage, params }
    }
}

#[async_trait]
pub trait Executor: Send + Sync {
    fn name(&self) -> &'static str;
    fn can_handle(&self, stmt: &Statement) -> bool;
    async fn execute(&self, stmt: &Statement, ctx: &ExecutionContext<'_>)
        -> Result<StatementResult>;
}

/// Ordered executor registry; the first executor claiming a statement
/// runs it.
pub struct ExecutorPipeline {
    executors: Vec<Box<dyn Executor>>,
}

impl ExecutorPipeline {
    pub fn new() -> Self {
        Self {
            executors: Vec::new(),
        }
    }

    pub fn register(&mut self, executor: Box<dyn Executor>) {
        self.executors.push(executor);
    }

    pub async fn dispatch(
        &self,
        stmt: &Statement,
        ctx: &ExecutionContext<'_>,
    ) -> Result<StatementResult> {
        for executor in &self.executors {
            if executor.can_handle(stmt) {
                return executor.execute(stmt, ctx).await;
            }
        }
        Err(DbError::UnsupportedOperation(format!(
            "No executor for statement: {:?}",
            stmt
        )))
    }
}

impl Default for ExecutorPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a WHERE equality into a column index and a value cast to the
/// column's type.
pub(crate) fn resolve_predicate(
    predicate: &crate::parser::ast::Predicate,
    schema: &crate::core::Schema,
    params: &[Value],
    table_name: &str,
) -> Result<(usize, Value)> {
    let idx = schema
        .find_column_index(&predicate.column)
        .ok_or_else(|| DbError::ColumnNotFound(predicate.column.clone(), table_name.into()))?;
    let raw = resolve_expr(&predicate.value, params, None)?;
    let value = schema.columns()[idx].data_type.cast_value(&raw)?;
    Ok((idx, value))
}

/// Resolve an expression against the bound parameters. `excluded` is the
/// proposed row of an upsert, keyed by column name, for
/// `EXCLUDED.<col>` references.
pub(crate) fn resolve_expr(
    expr: &Expr,
    params: &[Value],
    excluded: Option<&BTreeMap<String, Value>>,
) -> Result<Value> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Placeholder(index) => params.get(index - 1).cloned().ok_or_else(|| {
            DbError::ExecutionError(format!("Missing bind parameter ${index}"))
        }),
        Expr::Excluded(column) => excluded
            .and_then(|row| row.get(column))
            .cloned()
            .ok_or_else(|| {
                DbError::ExecutionError(format!("EXCLUDED.{column} outside an upsert"))
            }),
    }
}
