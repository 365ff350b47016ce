// ============================================================================
// sneaky_save — raw single-row persistence
// ============================================================================

//! Persist one in-memory record with a single direct INSERT or UPDATE,
//! bypassing whatever validation, callback or dirty-tracking pipeline
//! the host persistence layer normally runs. Built for bulk-write
//! scenarios where that pipeline is pure overhead.
//!
//! The caller describes the row explicitly — table, primary key, typed
//! column values, the set of changed columns — in a
//! [`RecordDescriptor`], and [`RawRowWriter`] turns it into exactly one
//! statement against any [`SqlBackend`]. A bundled [`MemoryBackend`]
//! executes the emitted SQL in-process for tests and embedded use.
//!
//! # Examples
//!
//! ```
//! use sneaky_save::{Column, DataType, MemoryBackend, RawRowWriter, RecordDescriptor};
//!
//! # tokio_test::block_on(async {
//! let backend = MemoryBackend::new();
//! backend
//!     .create_table(
//!         "fakes",
//!         vec![
//!             Column::new("id", DataType::Integer).primary_key().generated(),
//!             Column::new("name", DataType::Text),
//!         ],
//!     )
//!     .await
//!     .unwrap();
//!
//! let writer = RawRowWriter::new(&backend);
//!
//! // Insert: the backend assigns the key.
//! let mut record = RecordDescriptor::new_record("fakes", "id").set_changed("name", "test");
//! writer.save_or_fail(&mut record, None).await.unwrap();
//!
//! // Update: only the dirty columns travel.
//! record.mark_changed("name");
//! let result = writer.save_or_fail(&mut record, None).await.unwrap();
//! assert_eq!(result.rows_affected, 1);
//! # });
//! ```

pub mod backend;
pub mod core;
pub mod record;
pub mod writer;

mod executor;
mod parser;
mod storage;

pub mod prelude;

// Re-export main types for convenience
pub use backend::{MemoryBackend, SqlBackend, StatementResult};
pub use core::{Column, DataType, DbError, RangeValue, Result, Row, Schema, Value, WriteError};
pub use record::{ConflictPolicy, RecordDescriptor, WriteResult};
pub use writer::RawRowWriter;
