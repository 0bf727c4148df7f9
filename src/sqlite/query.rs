use rusqlite::{Rows, Statement, params_from_iter};

use crate::cursor::Cursor;
use crate::decode::{fetch_row, fetch_rows};
use crate::error::{BoxError, RecordSetError};
use crate::results::{Record, RecordSet};
use crate::types::ScalarValue;

use super::params::value_bytes;

/// [`Cursor`] over the rows of a running rusqlite query.
///
/// Each `advance` reads the whole row into its textual wire form, so
/// `scan_into` can be called any number of times per row. Closing drops the
/// underlying `Rows`, which resets the statement.
pub struct SqliteCursor<'stmt> {
    rows: Option<Rows<'stmt>>,
    columns: Vec<String>,
    current: Vec<Option<Vec<u8>>>,
    error: Option<rusqlite::Error>,
}

impl<'stmt> SqliteCursor<'stmt> {
    /// Start `stmt` with `args` and wrap the resulting rows.
    ///
    /// # Errors
    /// Returns the rusqlite error if binding the parameters fails.
    pub fn new(
        stmt: &'stmt mut Statement<'_>,
        args: &[ScalarValue],
    ) -> Result<Self, RecordSetError> {
        let columns: Vec<String> = stmt
            .column_names()
            .iter()
            .map(std::string::ToString::to_string)
            .collect();
        let rows = stmt.query(params_from_iter(args))?;
        Ok(Self {
            rows: Some(rows),
            current: Vec::with_capacity(columns.len()),
            columns,
            error: None,
        })
    }
}

impl Cursor for SqliteCursor<'_> {
    fn column_names(&mut self) -> Result<Vec<String>, BoxError> {
        Ok(self.columns.clone())
    }

    fn advance(&mut self) -> bool {
        let Some(rows) = self.rows.as_mut() else {
            return false;
        };
        let row = match rows.next() {
            Ok(Some(row)) => row,
            Ok(None) => return false,
            Err(err) => {
                self.error = Some(err);
                return false;
            }
        };
        self.current.clear();
        for idx in 0..self.columns.len() {
            match row.get_ref(idx) {
                Ok(value) => self.current.push(value_bytes(value)),
                Err(err) => {
                    self.error = Some(err);
                    return false;
                }
            }
        }
        true
    }

    fn scan_into(&mut self, buffers: &mut [Option<Vec<u8>>]) -> Result<(), BoxError> {
        if buffers.len() != self.current.len() {
            return Err(format!(
                "expected {} destination buffers, got {}",
                self.current.len(),
                buffers.len()
            )
            .into());
        }
        buffers.clone_from_slice(&self.current);
        Ok(())
    }

    fn last_error(&mut self) -> Option<BoxError> {
        self.error.take().map(Into::into)
    }

    fn close(&mut self) {
        self.rows = None;
        self.current.clear();
    }
}

/// Run `sql` and decode every row.
///
/// `conn` may be a `rusqlite::Transaction` through deref.
///
/// # Errors
/// Returns `RecordSetError::SqliteError` if the query cannot be prepared or bound,
/// and `RecordSetError::DecodeError` if reading the rows fails.
pub fn query_records(
    conn: &rusqlite::Connection,
    sql: &str,
    args: &[ScalarValue],
) -> Result<RecordSet, RecordSetError> {
    let mut stmt = conn.prepare(sql)?;
    fetch_rows(SqliteCursor::new(&mut stmt, args)?)
}

/// Run `sql` and hand decoded rows to `proc` until it returns `false`.
///
/// # Errors
/// Same as [`query_records`].
pub fn query_each<F>(
    conn: &rusqlite::Connection,
    sql: &str,
    args: &[ScalarValue],
    proc: F,
) -> Result<(), RecordSetError>
where
    F: FnMut(Record) -> bool,
{
    let mut stmt = conn.prepare(sql)?;
    fetch_row(SqliteCursor::new(&mut stmt, args)?, proc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::range_rows;

    fn seeded() -> rusqlite::Connection {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER, score REAL, name TEXT, data BLOB);
             INSERT INTO t VALUES (1, 1.5, 'ann', x'6869'), (2, NULL, NULL, NULL);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn values_arrive_as_text() {
        let conn = seeded();
        let rows = query_records(&conn, "SELECT * FROM t ORDER BY id", &[]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].str("id"), "1");
        assert_eq!(rows[0].str("score"), "1.5");
        assert_eq!(rows[0].str("data"), "hi");
        assert_eq!(rows[0].columns().collect::<Vec<_>>(), ["id", "score", "name", "data"]);
        assert!(rows[1].get("name").unwrap().is_null());
        assert_eq!(rows[1].float64("score"), 0.0);
    }

    #[test]
    fn arguments_bind() {
        let conn = seeded();
        let rows = query_records(
            &conn,
            "SELECT name FROM t WHERE id = ?1",
            &[ScalarValue::from("1")],
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].str("name"), "ann");
    }

    #[test]
    fn bad_sql_is_a_driver_error() {
        let conn = seeded();
        let err = query_records(&conn, "SELECT nope FROM t", &[]).unwrap_err();
        assert!(matches!(err, RecordSetError::SqliteError(_)));
    }

    #[test]
    fn closed_cursor_stops_advancing() {
        let conn = seeded();
        let mut stmt = conn.prepare("SELECT id FROM t").unwrap();
        let mut cursor = SqliteCursor::new(&mut stmt, &[]).unwrap();
        assert!(cursor.advance());
        cursor.close();
        assert!(!cursor.advance());
        assert!(cursor.last_error().is_none());
    }

    #[test]
    fn raw_iteration_scans_on_demand() {
        let conn = seeded();
        let mut stmt = conn.prepare("SELECT id FROM t ORDER BY id").unwrap();
        let cursor = SqliteCursor::new(&mut stmt, &[]).unwrap();
        let mut ids = Vec::new();
        range_rows(cursor, |c| {
            let mut buf: [Option<Vec<u8>>; 1] = [None];
            if c.scan_into(&mut buf).is_err() {
                return false;
            }
            ids.push(buf[0].take());
            true
        })
        .unwrap();
        assert_eq!(ids, [Some(b"1".to_vec()), Some(b"2".to_vec())]);
    }
}
