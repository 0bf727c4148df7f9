//! Loosely-typed record sets for moving tabular data in and out of SQL without
//! per-table scan code or hand-written batch statements.
//!
//! - [`decode`] drains a [`Cursor`] into [`Record`]s of text-or-NULL
//!   [`ScalarValue`]s, always releasing the cursor.
//! - [`batch`] turns record sets back into INSERT/REPLACE/UPDATE/DELETE
//!   statements, run atomically through a [`TxScope`].
//! - [`executor`] is the prepare/execute/run surface shared by connections and
//!   transactions; the `sqlite` feature implements it for `rusqlite`.
//!
//! ```rust
//! # #[cfg(feature = "sqlite")]
//! # fn main() -> Result<(), sql_recordset::RecordSetError> {
//! use sql_recordset::prelude::*;
//!
//! let mut conn = rusqlite::Connection::open_in_memory()?;
//! conn.execute_batch("CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT)")?;
//!
//! let rows: Vec<Record> = vec![
//!     [("id", "1"), ("name", "ann")].into_iter().collect(),
//!     [("id", "2"), ("name", "bo")].into_iter().collect(),
//! ];
//! assert_eq!(insert_rows(&mut conn, "people", &rows)?, 2);
//!
//! let back = query_records(&conn, "SELECT * FROM people ORDER BY id", &[])?;
//! assert_eq!(back[1].str("name"), "bo");
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "sqlite"))]
//! # fn main() {}
//! ```

pub mod batch;
pub mod cursor;
pub mod decode;
pub mod dsn;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod results;
pub mod types;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use batch::{delete_rows, insert_rows, replace_rows, update_rows};
pub use cursor::Cursor;
pub use decode::{fetch_row, fetch_rows, range_rows};
pub use dsn::{Driver, Dsn, DsnBuilder};
pub use error::{BatchOp, BoxError, RecordSetError};
pub use executor::{BatchTarget, Connection, Executor, PreparedStatement, Transaction, TxScope};
pub use results::{Record, RecordSet, stringify};
pub use types::ScalarValue;
