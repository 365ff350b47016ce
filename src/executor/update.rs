use async_trait::async_trait;

use super::{resolve_expr, resolve_predicate, ExecutionContext, Executor};
use crate::backend::StatementResult;
use crate::core::{DbError, Result};
use crate::parser::ast::{Statement, UpdateStmt};

pub struct UpdateExecutor;

#[async_trait]
impl Executor for UpdateExecutor {
    fn name(&self) -> &'static str {
        "UPDATE"
    }

    fn can_handle(&self, stmt: &Statement) -> bool {
        matches!(stmt, Statement::Update(_))
    }

    async fn execute(
        &self,
        stmt: &Statement,
        ctx: &ExecutionContext<'_>,
    ) -> Result<StatementResult> {
        let Statement::Update(update) = stmt else {
            unreachable!();
        };

        self.execute_update(update, ctx).await
    }
}

impl UpdateExecutor {
    async fn execute_update(
        &self,
        update: &UpdateStmt,
        ctx: &ExecutionContext<'_>,
    ) -> Result<StatementResult> {
        let table_handle = ctx.storage.get_table(&update.table_name).await?;
        let mut table = table_handle.write().await;
        let schema = table.schema().schema().clone();

        let predicate = update
            .selection
            .as_ref()
            .map(|p| resolve_predicate(p, &schema, ctx.params, &update.table_name))
            .transpose()?;

        let mut matched = 0u64;
        for (id, row) in table.scan_with_ids() {
            if let Some((idx, ref value)) = predicate {
                if &row[idx] != value {
                    continue;
                }
            }

            let mut new_row = row.clone();
            for assign in &update.assignments {
                let idx = schema.find_column_index(&assign.column).ok_or_else(|| {
                    DbError::ColumnNotFound(assign.column.clone(), update.table_name.clone())
                })?;
                let raw = resolve_expr(&assign.value, ctx.params, None)?;
                new_row[idx] = schema.columns()[idx].data_type.cast_value(&raw)?;
            }

            if table.update(id, new_row)? {
                matched += 1;
            }
        }

        Ok(StatementResult::affected(matched))
    }
}
