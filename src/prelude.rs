//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::batch::{delete_rows, insert_rows, replace_rows, update_rows};
pub use crate::cursor::Cursor;
pub use crate::decode::{fetch_row, fetch_rows, range_rows};
pub use crate::dsn::{Driver, Dsn};
pub use crate::error::{BatchOp, RecordSetError};
pub use crate::executor::{BatchTarget, TxScope};
pub use crate::results::{Record, RecordSet, stringify};
pub use crate::types::ScalarValue;

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteCursor, query_each, query_records};
