use std::collections::BTreeMap;

use crate::core::{Column, DbError, Result, Row, Schema, Value};

/// One table: schema plus rows keyed by an internal row id. No
/// versioning — each statement is atomic on its own and concurrent
/// writers rely on the per-table lock in [`super::MemoryStorage`].
#[derive(Debug)]
pub struct Table {
    schema: TableSchema,
    rows: BTreeMap<usize, Row>,
    next_row_id: usize,
    next_key: i64,
}

impl Table {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: BTreeMap::new(),
            next_row_id: 0,
            next_key: 0,
        }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Next sequence value for a generated key column.
    pub fn next_generated_key(&mut self) -> i64 {
        self.next_key += 1;
        self.next_key
    }

    pub fn insert(&mut self, row: Row) -> Result<usize> {
        self.validate_row(&row)?;
        self.check_uniqueness(&row, None)?;

        let id = self.next_row_id;
        self.next_row_id += 1;
        self.rows.insert(id, row);
        Ok(id)
    }

    pub fn update(&mut self, id: usize, new_row: Row) -> Result<bool> {
        self.validate_row(&new_row)?;
        self.check_uniqueness(&new_row, Some(id))?;

        match self.rows.get_mut(&id) {
            Some(row) => {
                *row = new_row;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn scan(&self) -> Vec<Row> {
        self.rows.values().cloned().collect()
    }

    pub fn scan_with_ids(&self) -> Vec<(usize, Row)> {
        self.rows
            .iter()
            .map(|(id, row)| (*id, row.clone()))
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Find the row matching `value` on every listed column. Used by the
    /// upsert path to locate the conflicting row.
    pub fn find_by_columns(&self, columns: &[usize], values: &[Value]) -> Option<usize> {
        self.rows.iter().find_map(|(id, row)| {
            columns
                .iter()
                .zip(values)
                .all(|(idx, value)| &row[*idx] == value)
                .then_some(*id)
        })
    }

    pub fn get(&self, id: usize) -> Option<&Row> {
        self.rows.get(&id)
    }

    fn validate_row(&self, row: &Row) -> Result<()> {
        let columns = self.schema.schema().columns();
        if row.len() != columns.len() {
            return Err(DbError::ExecutionError(format!(
                "Expected {} columns, got {}",
                columns.len(),
                row.len()
            )));
        }
        for (column, value) in columns.iter().zip(row.iter()) {
            column.validate(value)?;
        }
        Ok(())
    }

    fn check_uniqueness(&self, row: &Row, ignore_id: Option<usize>) -> Result<()> {
        for (col_idx, column) in self.schema.schema().columns().iter().enumerate() {
            if !column.primary_key && !column.unique {
                continue;
            }
            let value = &row[col_idx];
            if value.is_null() {
                continue;
            }

            for (id, existing) in &self.rows {
                if Some(*id) == ignore_id {
                    continue;
                }
                if &existing[col_idx] == value {
                    return Err(DbError::ConstraintViolation(format!(
                        "Unique constraint violation: Column '{}' already contains value {}",
                        column.name, value
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct TableSchema {
    name: String,
    schema: Schema,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            schema: Schema::new(columns),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataType;

    fn users_schema() -> TableSchema {
        TableSchema::new(
            "users",
            vec![
                Column::new("id", DataType::Integer).primary_key(),
                Column::new("email", DataType::Text).unique(),
            ],
        )
    }

    #[test]
    fn test_insert_rejects_duplicate_unique_value() {
        let mut table = Table::new(users_schema());
        table
            .insert(vec![Value::Integer(1), Value::Text("a@x".into())])
            .unwrap();
        let err = table
            .insert(vec![Value::Integer(2), Value::Text("a@x".into())])
            .unwrap_err();
        assert!(matches!(err, DbError::ConstraintViolation(_)));
    }

    #[test]
    fn test_update_ignores_own_row_in_uniqueness() {
        let mut table = Table::new(users_schema());
        let id = table
            .insert(vec![Value::Integer(1), Value::Text("a@x".into())])
            .unwrap();
        assert!(table
            .update(id, vec![Value::Integer(1), Value::Text("a@x".into())])
            .unwrap());
    }

    #[test]
    fn test_find_by_columns() {
        let mut table = Table::new(users_schema());
        let id = table
            .insert(vec![Value::Integer(1), Value::Text("a@x".into())])
            .unwrap();
        assert_eq!(
            table.find_by_columns(&[1], &[Value::Text("a@x".into())]),
            Some(id)
        );
        assert_eq!(table.find_by_columns(&[1], &[Value::Text("b@x".into())]), None);
    }
}
