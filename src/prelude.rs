//! Everything a typical caller needs in one import.
//!
//! ```
//! use sneaky_save::prelude::*;
//! ```

pub use crate::backend::{MemoryBackend, SqlBackend, StatementResult};
pub use crate::core::{Column, DataType, DbError, RangeValue, Value, WriteError};
pub use crate::record::{ConflictPolicy, RecordDescriptor, WriteResult};
pub use crate::writer::RawRowWriter;
