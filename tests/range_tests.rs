use chrono::NaiveDate;
use sneaky_save::{
    Column, DataType, MemoryBackend, RangeValue, RawRowWriter, RecordDescriptor, SqlBackend, Value,
};

async fn bookings_backend() -> MemoryBackend {
    let backend = MemoryBackend::new();
    backend
        .create_table(
            "bookings",
            vec![
                Column::new("id", DataType::Integer).primary_key().generated(),
                Column::new("period", DataType::Range),
            ],
        )
        .await
        .unwrap();
    backend
}

fn january() -> RangeValue {
    RangeValue::half_open(
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
    )
}

#[tokio::test]
async fn test_range_column_round_trips_as_one_interval() {
    let backend = bookings_backend().await;
    let writer = RawRowWriter::new(&backend);

    let mut record = RecordDescriptor::new_record("bookings", "id").set_changed("period", january());
    let result = writer.save_or_fail(&mut record, None).await.unwrap();

    assert_eq!(result.rows_affected, 1);
    // One row, one interval — the range did not expand into multiple
    // values on the way through parameter binding.
    assert_eq!(backend.row_count("bookings").await.unwrap(), 1);

    let rows = backend
        .query(
            "SELECT \"period\" FROM \"bookings\" WHERE \"id\" = $1",
            &[result.assigned_primary_key.unwrap()],
        )
        .await
        .unwrap();
    assert_eq!(rows.row_count(), 1);
    assert_eq!(rows.rows[0][0], Value::from(january()));
}

#[tokio::test]
async fn test_range_update_replaces_interval() {
    let backend = bookings_backend().await;
    let writer = RawRowWriter::new(&backend);

    let mut record = RecordDescriptor::new_record("bookings", "id").set_changed("period", january());
    let result = writer.save_or_fail(&mut record, None).await.unwrap();
    let key = result.assigned_primary_key.unwrap();

    let february = RangeValue::half_open(
        NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
    );
    record = record.set_changed("period", february.clone());
    let result = writer.save_or_fail(&mut record, None).await.unwrap();
    assert_eq!(result.rows_affected, 1);

    let rows = backend
        .query(
            "SELECT \"period\" FROM \"bookings\" WHERE \"id\" = $1",
            std::slice::from_ref(&key),
        )
        .await
        .unwrap();
    assert_eq!(rows.rows[0][0], Value::from(february));
}
