//! Batch INSERT/REPLACE/UPDATE/DELETE from record sets.
//!
//! Every operation runs inside a [`TxScope`]: handed a connection it owns the
//! transaction and nothing from a failed batch is left behind; handed a
//! transaction it runs inside it and leaves commit/rollback to the caller.
//! Statements execute in record order and the first failure aborts the batch.
//! Affected-row counts are summed over the executed statements.

pub mod statement;

use crate::error::{BatchOp, RecordSetError};
use crate::executor::{BatchTarget, TxScope};
use crate::results::Record;
use crate::types::ScalarValue;

/// Insert every record with one prepared `INSERT`.
///
/// The column list comes from the first record, in its column order; later
/// records bind NULL for any of those columns they lack and their extra columns
/// are ignored. An empty `rows` is a no-op that opens no transaction.
///
/// # Errors
/// - `RecordSetError::EmptyColumns` if the first record has no columns.
/// - `RecordSetError::StatementError` if preparing or executing fails.
/// - Transaction scope errors, see [`TxScope::run`].
pub fn insert_rows<'a>(
    target: impl Into<BatchTarget<'a>>,
    table: &str,
    rows: &[Record],
) -> Result<usize, RecordSetError> {
    write_rows(target.into(), BatchOp::Insert, table, rows)
}

/// Like [`insert_rows`] but with `REPLACE`.
///
/// # Errors
/// Same as [`insert_rows`].
pub fn replace_rows<'a>(
    target: impl Into<BatchTarget<'a>>,
    table: &str,
    rows: &[Record],
) -> Result<usize, RecordSetError> {
    write_rows(target.into(), BatchOp::Replace, table, rows)
}

fn write_rows(
    target: BatchTarget<'_>,
    op: BatchOp,
    table: &str,
    rows: &[Record],
) -> Result<usize, RecordSetError> {
    let Some(first) = rows.first() else {
        tracing::trace!(%op, table, "empty batch");
        return Ok(0);
    };
    let columns: Vec<&str> = first.columns().collect();
    if columns.is_empty() {
        return Err(RecordSetError::EmptyColumns {
            op,
            table: table.to_owned(),
        });
    }
    let sql = statement::insert_sql(op, table, &columns);

    TxScope::new(op, table).run(target, |exec| {
        tracing::debug!(%op, table, sql = %sql, rows = rows.len(), "preparing batch statement");
        let mut stmt = exec
            .prepare(&sql)
            .map_err(|e| RecordSetError::statement(op, table, e))?;
        let mut affected = 0;
        for (idx, row) in rows.iter().enumerate() {
            let args: Vec<ScalarValue> = columns
                .iter()
                .map(|column| row.get(column).cloned().unwrap_or_default())
                .collect();
            affected += stmt.execute(&args).map_err(|e| {
                tracing::debug!(%op, table, row = idx, "statement failed");
                RecordSetError::statement(op, table, e)
            })?;
        }
        Ok(affected)
    })
}

/// Delete one row per record, matched on the `keys` columns.
///
/// A NULL (or missing) key matches with `IS NULL`; other key values are bound.
/// Non-key columns are ignored. Empty `rows` or `keys` is a no-op that opens no
/// transaction.
///
/// # Errors
/// - `RecordSetError::StatementError` if a DELETE fails.
/// - Transaction scope errors, see [`TxScope::run`].
pub fn delete_rows<'a>(
    target: impl Into<BatchTarget<'a>>,
    table: &str,
    rows: &[Record],
    keys: &[&str],
) -> Result<usize, RecordSetError> {
    let op = BatchOp::Delete;
    if rows.is_empty() || keys.is_empty() {
        tracing::trace!(%op, table, "empty batch or key list");
        return Ok(0);
    }

    TxScope::new(op, table).run(target.into(), |exec| {
        let mut affected = 0;
        for (idx, row) in rows.iter().enumerate() {
            let (sql, args) = statement::delete_sql(table, row, keys);
            tracing::debug!(%op, table, row = idx, sql = %sql, "executing");
            affected += exec
                .run(&sql, &args)
                .map_err(|e| RecordSetError::statement(op, table, e))?;
        }
        Ok(affected)
    })
}

/// Update one row per record: the `keys` columns identify the row, every other
/// column is SET.
///
/// **Records are modified**: the key columns are removed from each record the
/// batch reaches, whether or not its UPDATE then succeeds. A record left with no
/// columns after that is skipped without executing anything. Empty `rows` or
/// `keys` is a no-op that opens no transaction and leaves the records untouched.
///
/// # Errors
/// - `RecordSetError::StatementError` if an UPDATE fails.
/// - Transaction scope errors, see [`TxScope::run`].
pub fn update_rows<'a>(
    target: impl Into<BatchTarget<'a>>,
    table: &str,
    rows: &mut [Record],
    keys: &[&str],
) -> Result<usize, RecordSetError> {
    let op = BatchOp::Update;
    if rows.is_empty() || keys.is_empty() {
        tracing::trace!(%op, table, "empty batch or key list");
        return Ok(0);
    }

    TxScope::new(op, table).run(target.into(), |exec| {
        let mut affected = 0;
        for (idx, row) in rows.iter_mut().enumerate() {
            let key_values: Vec<(&str, ScalarValue)> = keys
                .iter()
                .map(|key| (*key, row.remove(key).unwrap_or_default()))
                .collect();
            if row.is_empty() {
                tracing::trace!(%op, table, row = idx, "no settable columns, skipping");
                continue;
            }
            let (sql, args) = statement::update_sql(table, row, &key_values);
            tracing::debug!(%op, table, row = idx, sql = %sql, "executing");
            affected += exec
                .run(&sql, &args)
                .map_err(|e| RecordSetError::statement(op, table, e))?;
        }
        Ok(affected)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Call, ScriptedConnection, record};

    fn people() -> Vec<Record> {
        vec![
            record(&[("id", Some("1")), ("name", Some("ann"))]),
            record(&[("id", Some("2")), ("name", None)]),
            record(&[("id", Some("3")), ("name", Some("cy"))]),
        ]
    }

    #[test]
    fn insert_prepares_once_and_sums() {
        let mut conn = ScriptedConnection::new().affected([1, 1, 2]);
        let n = insert_rows(&mut conn, "people", &people()).unwrap();
        assert_eq!(n, 4);
        let calls = conn.calls();
        assert_eq!(calls.first(), Some(&Call::Begin));
        assert_eq!(
            calls[1],
            Call::Prepare("INSERT INTO `people` (`id`, `name`) VALUES (?, ?)".into())
        );
        assert_eq!(
            calls[3],
            Call::Execute(vec![ScalarValue::from("2"), ScalarValue::Null])
        );
        assert_eq!(calls.last(), Some(&Call::Commit));
        assert_eq!(conn.executions(), 3);
    }

    #[test]
    fn replace_uses_replace_verb() {
        let mut conn = ScriptedConnection::new();
        replace_rows(&mut conn, "people", &people()).unwrap();
        assert!(conn.sql()[0].starts_with("REPLACE INTO `people`"));
    }

    #[test]
    fn insert_uses_first_record_columns() {
        let mut conn = ScriptedConnection::new();
        let rows = vec![
            record(&[("id", Some("1")), ("name", Some("ann"))]),
            record(&[("id", Some("2")), ("extra", Some("ignored"))]),
        ];
        insert_rows(&mut conn, "people", &rows).unwrap();
        assert!(conn.calls().contains(&Call::Execute(vec![
            ScalarValue::from("2"),
            ScalarValue::Null
        ])));
    }

    #[test]
    fn empty_batches_touch_nothing() {
        let mut conn = ScriptedConnection::new();
        assert_eq!(insert_rows(&mut conn, "t", &[]).unwrap(), 0);
        assert_eq!(replace_rows(&mut conn, "t", &[]).unwrap(), 0);
        assert_eq!(delete_rows(&mut conn, "t", &[], &["id"]).unwrap(), 0);
        assert_eq!(update_rows(&mut conn, "t", &mut [], &["id"]).unwrap(), 0);
        assert!(conn.calls().is_empty());
    }

    #[test]
    fn empty_key_list_touches_nothing() {
        let mut conn = ScriptedConnection::new();
        let mut rows = people();
        assert_eq!(delete_rows(&mut conn, "t", &rows, &[]).unwrap(), 0);
        assert_eq!(update_rows(&mut conn, "t", &mut rows, &[]).unwrap(), 0);
        assert!(conn.calls().is_empty());
        assert_eq!(rows, people());
    }

    #[test]
    fn insert_with_columnless_first_record_fails_early() {
        let mut conn = ScriptedConnection::new();
        let err = insert_rows(&mut conn, "t", &[Record::new()]).unwrap_err();
        assert!(matches!(err, RecordSetError::EmptyColumns { op: BatchOp::Insert, .. }));
        assert!(conn.calls().is_empty());
    }

    #[test]
    fn failure_mid_batch_rolls_back() {
        let mut conn = ScriptedConnection::new().fail_on_execution(2);
        let err = insert_rows(&mut conn, "people", &people()).unwrap_err();
        match err {
            RecordSetError::StatementError { op, table, .. } => {
                assert_eq!(op, BatchOp::Insert);
                assert_eq!(table, "people");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(conn.executions(), 2);
        assert_eq!(conn.calls().last(), Some(&Call::Rollback));
        assert!(!conn.calls().contains(&Call::Commit));
    }

    #[test]
    fn prepare_failure_rolls_back() {
        let mut conn = ScriptedConnection::new().fail_prepare();
        let err = insert_rows(&mut conn, "people", &people()).unwrap_err();
        assert!(matches!(err, RecordSetError::StatementError { .. }));
        assert_eq!(conn.executions(), 0);
        assert_eq!(conn.calls().last(), Some(&Call::Rollback));
    }

    #[test]
    fn delete_one_statement_per_row() {
        let mut conn = ScriptedConnection::new().affected([1, 0, 1]);
        let n = delete_rows(&mut conn, "people", &people(), &["id", "name"]).unwrap();
        assert_eq!(n, 2);
        assert_eq!(
            conn.sql(),
            [
                "DELETE FROM `people` WHERE (`id` = ?) AND (`name` = ?)",
                "DELETE FROM `people` WHERE (`id` = ?) AND (`name` IS NULL)",
                "DELETE FROM `people` WHERE (`id` = ?) AND (`name` = ?)",
            ]
        );
        assert!(conn.calls().contains(&Call::Run(
            "DELETE FROM `people` WHERE (`id` = ?) AND (`name` IS NULL)".into(),
            vec![ScalarValue::from("2")]
        )));
    }

    #[test]
    fn update_strips_keys_and_skips_key_only_rows() {
        let mut conn = ScriptedConnection::new();
        let mut rows = vec![
            record(&[("id", Some("1")), ("name", Some("ann")), ("note", None)]),
            record(&[("id", Some("2"))]),
            record(&[("id", None), ("name", Some("cy"))]),
        ];
        let n = update_rows(&mut conn, "people", &mut rows, &["id"]).unwrap();
        assert_eq!(n, 2);
        assert_eq!(
            conn.sql(),
            [
                "UPDATE `people` SET `name` = ?, `note` = NULL WHERE (`id` = ?)",
                "UPDATE `people` SET `name` = ? WHERE (`id` IS NULL)",
            ]
        );
        assert!(conn.calls().contains(&Call::Run(
            "UPDATE `people` SET `name` = ?, `note` = NULL WHERE (`id` = ?)".into(),
            vec![ScalarValue::from("ann"), ScalarValue::from("1")]
        )));
        assert!(rows.iter().all(|r| !r.contains("id")));
        assert!(rows[1].is_empty());
    }

    #[test]
    fn update_of_key_only_rows_still_commits() {
        let mut conn = ScriptedConnection::new();
        let mut rows = vec![record(&[("id", Some("1"))])];
        assert_eq!(update_rows(&mut conn, "t", &mut rows, &["id"]).unwrap(), 0);
        assert_eq!(conn.calls(), [Call::Begin, Call::Commit]);
    }

    #[test]
    fn batches_compose_in_caller_transaction() {
        let conn = ScriptedConnection::new();
        let tx = conn.outer_transaction();
        insert_rows(&tx, "people", &people()).unwrap();
        delete_rows(&tx, "people", &people(), &["id"]).unwrap();
        let calls = conn.calls();
        assert!(!calls.contains(&Call::Begin));
        assert!(!calls.contains(&Call::Commit));
        assert_eq!(conn.executions(), 6);
    }

    #[test]
    fn failure_in_caller_transaction_is_not_rolled_back_here() {
        let conn = ScriptedConnection::new().fail_on_execution(1);
        let tx = conn.outer_transaction();
        let mut rows = people();
        assert!(update_rows(&tx, "people", &mut rows, &["id"]).is_err());
        assert!(!conn.calls().contains(&Call::Rollback));
        // only the first record was reached
        assert!(!rows[0].contains("id"));
        assert!(rows[1].contains("id"));
    }

    #[test]
    fn connection_with_open_transaction_is_rejected() {
        let mut conn = ScriptedConnection::new().inside_transaction();
        let err = delete_rows(&mut conn, "people", &people(), &["id"]).unwrap_err();
        assert!(matches!(err, RecordSetError::InvalidHandle(_)));
        assert!(conn.calls().is_empty());
    }
}
