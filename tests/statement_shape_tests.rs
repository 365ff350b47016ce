//! Assertions on the exact statements and parameters the writer hands
//! to its backend, using a recording stand-in instead of a real engine.

use std::sync::Mutex;

use async_trait::async_trait;
use sneaky_save::{
    ConflictPolicy, RangeValue, RawRowWriter, RecordDescriptor, Result, SqlBackend,
    StatementResult, Value,
};

#[derive(Default)]
struct RecordingBackend {
    calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl RecordingBackend {
    fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SqlBackend for RecordingBackend {
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult> {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        Ok(StatementResult::affected(1))
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<StatementResult> {
        self.execute(sql, params).await
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_new_record_issues_exactly_one_insert() {
    let backend = RecordingBackend::default();
    let writer = RawRowWriter::new(&backend);

    let mut record = RecordDescriptor::new_record("fakes", "id").set_changed("name", "test");
    writer.save_or_fail(&mut record, None).await.unwrap();

    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "INSERT INTO \"fakes\" (\"name\") VALUES ($1)");
    assert_eq!(calls[0].1, vec![Value::Text("test".into())]);
}

#[tokio::test]
async fn test_clean_record_issues_no_statement() {
    let backend = RecordingBackend::default();
    let writer = RawRowWriter::new(&backend);

    let mut record = RecordDescriptor::existing("fakes", "id").set("id", 1i64);
    let result = writer.save_or_fail(&mut record, None).await.unwrap();

    assert_eq!(result.rows_affected, 0);
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_unset_primary_key_is_omitted_not_null_bound() {
    let backend = RecordingBackend::default();
    let writer = RawRowWriter::new(&backend);

    let mut record = RecordDescriptor::new_record("fakes", "id")
        .set("id", Value::Null)
        .set_changed("name", "test");
    writer.save_or_fail(&mut record, None).await.unwrap();

    let (sql, params) = backend.calls().remove(0);
    assert!(!sql.contains("\"id\""));
    assert_eq!(params.len(), 1);
}

#[tokio::test]
async fn test_all_columns_excluded_falls_back_to_default_values() {
    let backend = RecordingBackend::default();
    let writer = RawRowWriter::new(&backend);

    let mut record = RecordDescriptor::new_record("fakes", "id").set("id", Value::Null);
    writer.save_or_fail(&mut record, None).await.unwrap();

    let (sql, params) = backend.calls().remove(0);
    assert_eq!(sql, "INSERT INTO \"fakes\" DEFAULT VALUES");
    assert!(params.is_empty());
}

#[tokio::test]
async fn test_update_binds_pre_change_primary_key_last() {
    let backend = RecordingBackend::default();
    let writer = RawRowWriter::new(&backend);

    let mut record = RecordDescriptor::existing("fakes", "id")
        .set("id", 1i64)
        .set_changed("name", "renamed");
    record.rekey(2i64);
    writer.save_or_fail(&mut record, None).await.unwrap();

    let (sql, params) = backend.calls().remove(0);
    assert_eq!(
        sql,
        "UPDATE \"fakes\" SET \"id\" = $1, \"name\" = $2 WHERE \"id\" = $3"
    );
    // New key travels in the SET list; the predicate uses the original.
    assert_eq!(params[0], Value::Integer(2));
    assert_eq!(params[2], Value::Integer(1));
}

#[tokio::test]
async fn test_conflict_policy_filter_appears_in_statement() {
    let backend = RecordingBackend::default();
    let writer = RawRowWriter::new(&backend);

    let policy = ConflictPolicy::on(["email"]).with_filter("deleted_at IS NULL");
    let mut record = RecordDescriptor::new_record("users", "id")
        .set_changed("email", "a@example.com")
        .set_changed("name", "Alice");
    writer.save_or_fail(&mut record, Some(&policy)).await.unwrap();

    let (sql, _) = backend.calls().remove(0);
    assert!(sql.contains("ON CONFLICT (\"email\") WHERE deleted_at IS NULL DO UPDATE SET"));
    assert!(sql.ends_with("RETURNING *"));
}

#[tokio::test]
async fn test_range_parameter_is_bound_as_scalar_literal() {
    let backend = RecordingBackend::default();
    let writer = RawRowWriter::new(&backend);

    let mut record = RecordDescriptor::new_record("bookings", "id")
        .set_changed("period", RangeValue::half_open(1i64, 5i64));
    writer.save_or_fail(&mut record, None).await.unwrap();

    let (_, params) = backend.calls().remove(0);
    assert_eq!(params, vec![Value::Text("[1,5)".into())]);
}

#[tokio::test]
async fn test_update_reads_live_value_at_write_time() {
    let backend = RecordingBackend::default();
    let writer = RawRowWriter::new(&backend);

    let mut record = RecordDescriptor::existing("fakes", "id")
        .set("id", 1i64)
        .set_changed("name", "first");
    // A later mutation of the same column wins; the write reflects the
    // record's present state, not a captured pair.
    record = record.set_changed("name", "second");
    writer.save_or_fail(&mut record, None).await.unwrap();

    let (_, params) = backend.calls().remove(0);
    assert_eq!(params[0], Value::Text("second".into()));
}
