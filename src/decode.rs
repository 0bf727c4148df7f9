//! Row decoding: drains a [`Cursor`] into [`Record`]s.
//!
//! All three entry points take ownership of the cursor and close it before
//! returning, whether they finish, stop early at the caller's request, or fail.

use crate::cursor::{Cursor, CursorGuard};
use crate::error::RecordSetError;
use crate::results::{Record, RecordSet};
use crate::types::ScalarValue;

/// Decode every remaining row of `cursor` into a record set.
///
/// # Errors
/// Returns `RecordSetError::DecodeError` if the column list cannot be read, a row
/// cannot be scanned, or the cursor reports a terminal error. The cursor is closed
/// before the error is returned.
pub fn fetch_rows<C: Cursor>(cursor: C) -> Result<RecordSet, RecordSetError> {
    let mut records = RecordSet::new();
    fetch_row(cursor, |record| {
        records.push(record);
        true
    })?;
    Ok(records)
}

/// Decode rows one at a time, handing each to `proc` until it returns `false`
/// or the cursor is exhausted.
///
/// # Errors
/// Same conditions as [`fetch_rows`].
pub fn fetch_row<C, F>(cursor: C, mut proc: F) -> Result<(), RecordSetError>
where
    C: Cursor,
    F: FnMut(Record) -> bool,
{
    let mut cursor = CursorGuard::new(cursor);
    let columns = cursor
        .column_names()
        .map_err(RecordSetError::decode)?;
    let mut raw: Vec<Option<Vec<u8>>> = vec![None; columns.len()];

    let mut decoded = 0usize;
    while cursor.advance() {
        cursor
            .scan_into(&mut raw)
            .map_err(RecordSetError::decode)?;
        decoded += 1;
        if !proc(decode_record(&columns, &mut raw)) {
            tracing::trace!(rows = decoded, "row callback stopped decoding");
            break;
        }
    }
    check_terminal(&mut cursor)
}

/// Advance through the rows without decoding them, calling `proc` once per row.
///
/// `proc` receives the cursor so it can run its own [`Cursor::scan_into`];
/// returning `false` stops the iteration.
///
/// # Errors
/// Returns `RecordSetError::DecodeError` if the cursor reports a terminal error.
pub fn range_rows<C, F>(cursor: C, mut proc: F) -> Result<(), RecordSetError>
where
    C: Cursor,
    F: FnMut(&mut C) -> bool,
{
    let mut cursor = CursorGuard::new(cursor);
    while cursor.advance() {
        if !proc(&mut cursor) {
            break;
        }
    }
    check_terminal(&mut cursor)
}

fn check_terminal<C: Cursor>(cursor: &mut CursorGuard<C>) -> Result<(), RecordSetError> {
    match cursor.last_error() {
        Some(err) => Err(RecordSetError::decode(err)),
        None => Ok(()),
    }
}

fn decode_record(columns: &[String], raw: &mut [Option<Vec<u8>>]) -> Record {
    let mut record = Record::with_capacity(columns.len());
    for (name, slot) in columns.iter().zip(raw.iter_mut()) {
        let value = match slot.take() {
            None => ScalarValue::Null,
            Some(bytes) => ScalarValue::Text(
                String::from_utf8(bytes)
                    .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned()),
            ),
        };
        record.set(name.as_str(), value);
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScriptedCursor;

    fn people() -> ScriptedCursor {
        ScriptedCursor::new(["id", "name"])
            .row([Some("1"), Some("ann")])
            .row([Some("2"), None])
            .row([Some("3"), Some("cy")])
    }

    #[test]
    fn fetch_rows_decodes_all_and_closes() {
        let cursor = people();
        let closes = cursor.close_counter();
        let rows = fetch_rows(cursor).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].str("name"), "ann");
        assert!(rows[1].get("name").unwrap().is_null());
        assert_eq!(rows[2].int64("id"), 3);
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn fetch_row_stops_after_n_rows() {
        let cursor = people();
        let closes = cursor.close_counter();
        let advances = cursor.advance_counter();
        let mut seen = Vec::new();
        fetch_row(cursor, |rec| {
            seen.push(rec.int64("id"));
            seen.len() < 2
        })
        .unwrap();
        assert_eq!(seen, [1, 2]);
        assert_eq!(advances.get(), 2);
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn column_failure_still_closes() {
        let cursor = people().fail_columns("metadata gone");
        let closes = cursor.close_counter();
        let err = fetch_rows(cursor).unwrap_err();
        assert!(matches!(err, RecordSetError::DecodeError(_)));
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn scan_failure_still_closes() {
        let cursor = people().fail_scan_at(2, "bad row");
        let closes = cursor.close_counter();
        let mut seen = 0;
        let err = fetch_row(cursor, |_| {
            seen += 1;
            true
        })
        .unwrap_err();
        assert_eq!(seen, 1);
        assert!(err.to_string().contains("bad row"));
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn terminal_error_surfaces_after_rows() {
        let cursor = people().terminal_error("connection reset");
        let closes = cursor.close_counter();
        let err = fetch_rows(cursor).unwrap_err();
        assert!(err.to_string().contains("connection reset"));
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("connection reset"));
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let cursor = ScriptedCursor::new(["b"]).raw_row(vec![Some(vec![0x66, 0xff, 0x6f])]);
        let rows = fetch_rows(cursor).unwrap();
        assert_eq!(rows[0].str("b"), "f\u{fffd}o");
    }

    #[test]
    fn range_rows_hands_cursor_to_callback() {
        let cursor = people();
        let closes = cursor.close_counter();
        let mut names = Vec::new();
        range_rows(cursor, |c| {
            let mut buf: Vec<Option<Vec<u8>>> = vec![None, None];
            if c.scan_into(&mut buf).is_err() {
                return false;
            }
            names.push(buf[1].clone());
            true
        })
        .unwrap();
        assert_eq!(names, [Some(b"ann".to_vec()), None, Some(b"cy".to_vec())]);
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn range_rows_early_stop_closes_once() {
        let cursor = people();
        let closes = cursor.close_counter();
        let mut calls = 0;
        range_rows(cursor, |_| {
            calls += 1;
            false
        })
        .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn panicking_callback_still_closes() {
        let cursor = people();
        let closes = cursor.close_counter();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = fetch_row(cursor, |_| panic!("caller bug"));
        }));
        assert!(result.is_err());
        assert_eq!(closes.get(), 1);
    }
}
