// SQLite module - rusqlite implementations of the executor and cursor surfaces
//
// - params: binding `ScalarValue`s as rusqlite parameters
// - executor: `Executor`/`Connection`/`Transaction` for rusqlite handles
// - query: the `SqliteCursor` adapter plus query helpers built on the row decoder

pub mod executor;
pub mod params;
pub mod query;

pub use query::{SqliteCursor, query_each, query_records};
