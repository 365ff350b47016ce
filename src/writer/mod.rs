pub mod sql;

use crate::backend::{SqlBackend, StatementResult};
use crate::core::{DbError, Value, WriteError};
use crate::record::{ConflictPolicy, RecordDescriptor, WriteResult};

/// Translates one [`RecordDescriptor`] into exactly one INSERT or UPDATE,
/// executes it on the caller's connection, and reports the effect.
///
/// No validation, callback or lifecycle hook is ever invoked — that is
/// the entire reason this writer exists. The borrow of the backend lasts
/// for the writer's lifetime; the caller owns the connection and any
/// surrounding transaction.
///
/// # Examples
///
/// ```
/// use sneaky_save::{Column, DataType, MemoryBackend, RawRowWriter, RecordDescriptor};
///
/// # tokio_test::block_on(async {
/// let backend = MemoryBackend::new();
/// backend
///     .create_table(
///         "fakes",
///         vec![
///             Column::new("id", DataType::Integer).primary_key().generated(),
///             Column::new("name", DataType::Text),
///         ],
///     )
///     .await
///     .unwrap();
///
/// let mut record = RecordDescriptor::new_record("fakes", "id").set_changed("name", "test");
/// let writer = RawRowWriter::new(&backend);
/// let result = writer.save_or_fail(&mut record, None).await.unwrap();
/// assert_eq!(result.rows_affected, 1);
/// assert!(result.assigned_primary_key.is_some());
/// # });
/// ```
pub struct RawRowWriter<'a, B: SqlBackend> {
    backend: &'a B,
}

impl<'a, B: SqlBackend> RawRowWriter<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Dispatch on `is_new`: insert path for fresh records, update path
    /// for persisted ones.
    pub async fn write(
        &self,
        record: &mut RecordDescriptor,
        conflict: Option<&ConflictPolicy>,
    ) -> Result<WriteResult, WriteError> {
        if record.is_new() {
            self.insert(record, conflict).await
        } else {
            self.update(record).await
        }
    }

    /// Throwing entry point: propagates [`WriteError::StatementFailed`].
    pub async fn save_or_fail(
        &self,
        record: &mut RecordDescriptor,
        conflict: Option<&ConflictPolicy>,
    ) -> Result<WriteResult, WriteError> {
        self.write(record, conflict).await
    }

    /// Best-effort entry point: `None` signals a failed statement
    /// instead of propagating it. The underlying error is logged.
    pub async fn save(
        &self,
        record: &mut RecordDescriptor,
        conflict: Option<&ConflictPolicy>,
    ) -> Option<WriteResult> {
        match self.write(record, conflict).await {
            Ok(result) => Some(result),
            Err(err) => {
                log::warn!(
                    "sneaky save on '{}' failed: {}",
                    record.table_name(),
                    err
                );
                None
            }
        }
    }

    async fn insert(
        &self,
        record: &mut RecordDescriptor,
        conflict: Option<&ConflictPolicy>,
    ) -> Result<WriteResult, WriteError> {
        let pk = record.primary_key().to_string();
        let pk_missing = record.value(&pk).map_or(true, Value::is_null);

        let mut columns = Vec::new();
        let mut params = Vec::new();
        for (name, value) in record.values() {
            // Omit an unset primary key entirely; backends that assign
            // the key from a sequence reject an explicit NULL.
            if *name == pk && value.is_null() {
                continue;
            }
            columns.push(name.clone());
            params.push(sql::scalarize(value));
        }

        let result = if columns.is_empty() {
            let stmt = self.backend.empty_insert_statement(record.table_name());
            log::debug!("insert (defaults): {}", stmt);
            self.backend.execute(&stmt, &[]).await?
        } else {
            let stmt = sql::build_insert(record.table_name(), &columns, conflict);
            log::debug!("insert: {}", stmt);
            self.backend.execute(&stmt, &params).await?
        };

        let assigned = if pk_missing {
            self.returned_key(&pk, &result)
        } else {
            None
        };
        record.mark_persisted(assigned.clone());

        Ok(WriteResult {
            rows_affected: result.rows_affected,
            assigned_primary_key: assigned,
        })
    }

    async fn update(&self, record: &RecordDescriptor) -> Result<WriteResult, WriteError> {
        // "No changes" is an already-satisfied state, not an error.
        if !record.has_changes() {
            return Ok(WriteResult::unchanged());
        }

        // Snapshot the predicate key before anything else; when the key
        // itself changed the predicate uses the pre-change value.
        let key = record.predicate_key().cloned().ok_or_else(|| {
            WriteError::StatementFailed(DbError::ExecutionError(format!(
                "No primary key value for update on '{}'",
                record.table_name()
            )))
        })?;

        let mut columns = Vec::new();
        let mut params = Vec::new();
        // Re-read each changed column's live value from the descriptor;
        // it is authoritative over anything captured earlier.
        for name in record.changed() {
            let value = record.value(name).ok_or_else(|| {
                WriteError::StatementFailed(DbError::ColumnNotFound(
                    name.clone(),
                    record.table_name().to_string(),
                ))
            })?;
            columns.push(name.clone());
            params.push(sql::scalarize(value));
        }
        params.push(sql::scalarize(&key));

        let stmt = sql::build_update(record.table_name(), &columns, record.primary_key());
        log::debug!("update: {}", stmt);
        let result = self.backend.execute(&stmt, &params).await?;

        Ok(WriteResult {
            rows_affected: result.rows_affected,
            assigned_primary_key: None,
        })
    }

    /// Generated key from the backend's key channel, falling back to a
    /// RETURNING row when the statement carried one.
    fn returned_key(&self, pk: &str, result: &StatementResult) -> Option<Value> {
        if let Some(key) = &result.generated_key {
            return Some(key.clone());
        }
        let idx = result.columns.iter().position(|c| c == pk)?;
        let value = result.rows.first()?.get(idx)?;
        (!value.is_null()).then(|| value.clone())
    }
}
