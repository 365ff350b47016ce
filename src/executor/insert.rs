use std::collections::BTreeMap;

use async_trait::async_trait;

use super::{resolve_expr, ExecutionContext, Executor};
use crate::backend::StatementResult;
use crate::core::{DbError, Result, Value};
use crate::parser::ast::{ConflictAction, InsertStmt, Statement};

pub struct InsertExecutor;

#[async_trait]
impl Executor for InsertExecutor {
    fn name(&self) -> &'static str {
        "INSERT"
    }

    fn can_handle(&self, stmt: &Statement) -> bool {
        matches!(stmt, Statement::Insert(_))
    }

    async fn execute(
        &self,
        stmt: &Statement,
        ctx: &ExecutionContext<'_>,
    ) -> Result<StatementResult> {
        let Statement::Insert(insert) = stmt else {
            unreachable!();
        };

        self.execute_insert(insert, ctx).await
    }
}

impl InsertExecutor {
    async fn execute_insert(
        &self,
        insert: &InsertStmt,
        ctx: &ExecutionContext<'_>,
    ) -> Result<StatementResult> {
        let table_handle = ctx.storage.get_table(&insert.table_name).await?;
        let mut table = table_handle.write().await;
        let schema = table.schema().schema().clone();

        // Resolve the provided column/value pairs, casting each into its
        // column type.
        let mut provided: BTreeMap<String, Value> = BTreeMap::new();
        if let Some(exprs) = &insert.values {
            if insert.columns.is_empty() {
                return Err(DbError::UnsupportedOperation(
                    "INSERT without a column list not supported".into(),
                ));
            }
            if exprs.len() != insert.columns.len() {
                return Err(DbError::ExecutionError(format!(
                    "Expected {} values, got {}",
                    insert.columns.len(),
                    exprs.len()
                )));
            }
            for (name, expr) in insert.columns.iter().zip(exprs) {
                let column = schema.get_column(name).ok_or_else(|| {
                    DbError::ColumnNotFound(name.clone(), insert.table_name.clone())
                })?;
                let raw = resolve_expr(expr, ctx.params, None)?;
                provided.insert(name.clone(), column.data_type.cast_value(&raw)?);
            }
        }

        // Full row in schema order; omitted generated columns draw a key
        // from the table's sequence.
        let mut generated_key = None;
        let mut row = Vec::with_capacity(schema.column_count());
        for column in schema.columns() {
            let value = match provided.get(&column.name) {
                Some(value) => value.clone(),
                None if column.generated => {
                    let key = Value::Integer(table.next_generated_key());
                    generated_key = Some(key.clone());
                    key
                }
                None => Value::Null,
            };
            row.push(value);
        }

        if let Some(clause) = &insert.on_conflict {
            let target_idx = clause
                .target
                .iter()
                .map(|name| {
                    schema.find_column_index(name).ok_or_else(|| {
                        DbError::ColumnNotFound(name.clone(), insert.table_name.clone())
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let target_values: Vec<Value> =
                target_idx.iter().map(|idx| row[*idx].clone()).collect();

            if let Some(existing_id) = table.find_by_columns(&target_idx, &target_values) {
                let excluded: BTreeMap<String, Value> = schema
                    .columns()
                    .iter()
                    .zip(&row)
                    .map(|(col, value)| (col.name.clone(), value.clone()))
                    .collect();

                return match &clause.action {
                    ConflictAction::DoNothing => Ok(StatementResult::affected(0)),
                    ConflictAction::DoUpdate(assignments) => {
                        let mut updated = table
                            .get(existing_id)
                            .cloned()
                            .ok_or_else(|| {
                                DbError::ExecutionError("Conflicting row vanished".into())
                            })?;
                        for assign in assignments {
                            let idx =
                                schema.find_column_index(&assign.column).ok_or_else(|| {
                                    DbError::ColumnNotFound(
                                        assign.column.clone(),
                                        insert.table_name.clone(),
                                    )
                                })?;
                            let raw =
                                resolve_expr(&assign.value, ctx.params, Some(&excluded))?;
                            updated[idx] = schema.columns()[idx].data_type.cast_value(&raw)?;
                        }
                        table.update(existing_id, updated.clone())?;

                        let mut result = StatementResult::affected(1);
                        if insert.returning {
                            result.columns = schema.column_names();
                            result.rows = vec![updated];
                        }
                        Ok(result)
                    }
                };
            }
        }

        table.insert(row.clone())?;

        let mut result = StatementResult::affected(1);
        result.generated_key = generated_key;
        if insert.returning {
            result.columns = schema.column_names();
            result.rows = vec![row];
        }
        Ok(result)
    }
}
