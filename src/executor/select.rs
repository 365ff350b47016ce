use async_trait::async_trait;

use super::{resolve_predicate, ExecutionContext, Executor};
use crate::backend::StatementResult;
use crate::core::{DbError, Result};
use crate::parser::ast::{SelectStmt, Statement};

pub struct SelectExecutor;

#[async_trait]
impl Executor for SelectExecutor {
    fn name(&self) -> &'static str {
        "SELECT"
    }

    fn can_handle(&self, stmt: &Statement) -> bool {
        matches!(stmt, Statement::Select(_))
    }

    async fn execute(
        &self,
        stmt: &Statement,
        ctx: &ExecutionContext<'_>,
    ) -> Result<StatementResult> {
        let Statement::Select(select) = stmt else {
            unreachable!();
        };

        self.execute_select(select, ctx).await
    }
}

impl SelectExecutor {
    async fn execute_select(
        &self,
        select: &SelectStmt,
        ctx: &ExecutionContext<'_>,
    ) -> Result<StatementResult> {
        let table_handle = ctx.storage.get_table(&select.table_name).await?;
        let table = table_handle.read().await;
        let schema = table.schema().schema();

        let predicate = select
            .selection
            .as_ref()
            .map(|p| resolve_predicate(p, schema, ctx.params, &select.table_name))
            .transpose()?;

        // Empty projection is `SELECT *`.
        let projected: Vec<usize> = if select.projection.is_empty() {
            (0..schema.column_count()).collect()
        } else {
            select
                .projection
                .iter()
                .map(|name| {
                    schema.find_column_index(name).ok_or_else(|| {
                        DbError::ColumnNotFound(name.clone(), select.table_name.clone())
                    })
                })
                .collect::<Result<Vec<_>>>()?
        };

        let columns: Vec<String> = projected
            .iter()
            .map(|idx| schema.columns()[*idx].name.clone())
            .collect();

        let mut rows = Vec::new();
        for row in table.scan() {
            if let Some((idx, ref value)) = predicate {
                if &row[idx] != value {
                    continue;
                }
            }
            rows.push(projected.iter().map(|idx| row[*idx].clone()).collect());
        }

        Ok(StatementResult {
            columns,
            rows,
            rows_affected: 0,
            generated_key: None,
        })
    }
}
