pub mod error;
pub mod types;
pub mod value;

pub use error::{DbError, Result, WriteError};
pub use types::{Column, Row, Schema};
pub use value::{DataType, RangeValue, Value};
