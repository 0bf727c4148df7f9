use std::collections::BTreeMap;

use rusqlite::Connection;
use sql_recordset::prelude::*;

use crate::model::{Item, Op, Step, TABLE, TxMode};

const SCHEMA: &str = "CREATE TABLE sim_items (
    id    INTEGER PRIMARY KEY,
    grp   TEXT,
    label TEXT,
    qty   TEXT
)";

/// The real side of the simulation: one in-memory `SQLite` connection.
pub(crate) struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    pub(crate) fn open() -> Result<Self, RecordSetError> {
        let conn = Dsn::default().connect(Driver::Sqlite)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Run one step through the batch mutator.
    pub(crate) fn apply(&mut self, step: &mut Step) -> Result<usize, RecordSetError> {
        match step.tx {
            TxMode::Owned => run_op(&mut self.conn, &mut step.op),
            TxMode::OuterCommit | TxMode::OuterRollback => {
                let tx = self.conn.transaction()?;
                let outcome = run_op(&tx, &mut step.op);
                if step.tx == TxMode::OuterCommit && outcome.is_ok() {
                    tx.commit()?;
                } else {
                    tx.rollback()?;
                }
                outcome
            }
        }
    }

    pub(crate) fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    /// Current table contents, read back through the row decoder.
    pub(crate) fn snapshot(&self) -> Result<BTreeMap<i64, Item>, RecordSetError> {
        let mut rows = BTreeMap::new();
        query_each(
            &self.conn,
            "SELECT id, grp, label, qty FROM sim_items",
            &[],
            |rec| {
                rows.insert(rec.int64("id"), Item::from_record(&rec));
                true
            },
        )?;
        Ok(rows)
    }
}

fn run_op<'a>(target: impl Into<BatchTarget<'a>>, op: &mut Op) -> Result<usize, RecordSetError> {
    match op {
        Op::Insert(rows) | Op::FaultyInsert { rows, .. } => insert_rows(target, TABLE, rows),
        Op::Replace(rows) => replace_rows(target, TABLE, rows),
        Op::Update(rows) => update_rows(target, TABLE, rows, &["id"]),
        Op::Delete { key, rows } => delete_rows(target, TABLE, rows, key.columns()),
    }
}
