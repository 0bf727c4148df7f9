use std::collections::BTreeMap;
use std::fmt;

use sql_recordset::{Record, ScalarValue};

pub(crate) const TABLE: &str = "sim_items";
pub(crate) const COLUMNS: [&str; 4] = ["id", "grp", "label", "qty"];

/// The non-key columns of one `sim_items` row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Item {
    pub(crate) grp: Option<String>,
    pub(crate) label: Option<String>,
    pub(crate) qty: Option<String>,
}

impl Item {
    pub(crate) fn from_record(rec: &Record) -> Self {
        Self {
            grp: text(rec, "grp"),
            label: text(rec, "label"),
            qty: text(rec, "qty"),
        }
    }

    /// Overwrite only the columns `rec` carries.
    fn patch(&mut self, rec: &Record) {
        for (column, value) in rec.iter() {
            let value = value.as_nullable_str().map(str::to_owned);
            match column {
                "grp" => self.grp = value,
                "label" => self.label = value,
                "qty" => self.qty = value,
                _ => {}
            }
        }
    }
}

fn text(rec: &Record, column: &str) -> Option<String> {
    rec.nullable_str(column).map(str::to_owned)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeleteKey {
    Id,
    Group,
}

impl DeleteKey {
    pub(crate) fn columns(self) -> &'static [&'static str] {
        match self {
            DeleteKey::Id => &["id"],
            DeleteKey::Group => &["grp"],
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Op {
    Insert(Vec<Record>),
    Replace(Vec<Record>),
    /// Keyed by `id`.
    Update(Vec<Record>),
    Delete { key: DeleteKey, rows: Vec<Record> },
    /// An insert whose row at `dup_at` collides with an existing primary key.
    FaultyInsert { rows: Vec<Record>, dup_at: usize },
}

impl Op {
    pub(crate) fn rows(&self) -> &[Record] {
        match self {
            Op::Insert(rows) | Op::Replace(rows) | Op::Update(rows) => rows,
            Op::Delete { rows, .. } | Op::FaultyInsert { rows, .. } => rows,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.rows().len();
        match self {
            Op::Insert(_) => write!(f, "Insert({n})"),
            Op::Replace(_) => write!(f, "Replace({n})"),
            Op::Update(_) => write!(f, "Update({n})"),
            Op::Delete { key, .. } => write!(f, "Delete({n}, by {key:?})"),
            Op::FaultyInsert { dup_at, .. } => write!(f, "FaultyInsert({n}, dup at {dup_at})"),
        }
    }
}

/// How a step's batch is wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TxMode {
    /// Handed the connection; the batch owns its transaction.
    Owned,
    /// Run inside a caller transaction that is committed afterwards.
    OuterCommit,
    /// Run inside a caller transaction that is rolled back afterwards.
    OuterRollback,
}

#[derive(Debug, Clone)]
pub(crate) struct Step {
    pub(crate) op: Op,
    pub(crate) tx: TxMode,
}

impl Step {
    /// Whether the table should reflect this step once it finishes.
    pub(crate) fn persists(&self) -> bool {
        match (&self.op, self.tx) {
            (Op::FaultyInsert { .. }, _) | (_, TxMode::OuterRollback) => false,
            (_, TxMode::Owned | TxMode::OuterCommit) => true,
        }
    }
}

/// What the model predicts a step returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Expected {
    Affected(usize),
    Failure,
}

/// In-memory mirror of `sim_items`.
#[derive(Debug, Clone, Default)]
pub(crate) struct TableModel {
    pub(crate) rows: BTreeMap<i64, Item>,
    next_id: i64,
}

impl TableModel {
    pub(crate) fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub(crate) fn reserve_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn ids(&self) -> Vec<i64> {
        self.rows.keys().copied().collect()
    }

    /// Apply `op` the way the batch mutator should, returning the expected result.
    pub(crate) fn apply(&mut self, op: &Op) -> Expected {
        match op {
            Op::Insert(rows) | Op::Replace(rows) => {
                for rec in rows {
                    self.rows.insert(rec.int64("id"), Item::from_record(rec));
                }
                Expected::Affected(rows.len())
            }
            Op::Update(rows) => {
                let mut affected = 0;
                for rec in rows {
                    if rec.len() <= 1 {
                        continue;
                    }
                    if let Some(item) = self.rows.get_mut(&rec.int64("id")) {
                        item.patch(rec);
                        affected += 1;
                    }
                }
                Expected::Affected(affected)
            }
            Op::Delete { key, rows } => {
                let mut affected = 0;
                for rec in rows {
                    let before = self.rows.len();
                    match key {
                        DeleteKey::Id => {
                            self.rows.remove(&rec.int64("id"));
                        }
                        DeleteKey::Group => {
                            let grp = rec.nullable_str("grp");
                            self.rows.retain(|_, item| item.grp.as_deref() != grp);
                        }
                    }
                    affected += before - self.rows.len();
                }
                Expected::Affected(affected)
            }
            Op::FaultyInsert { .. } => Expected::Failure,
        }
    }
}

/// Build a full `sim_items` record.
pub(crate) fn item_record(id: i64, item: &Item) -> Record {
    let mut rec = Record::with_capacity(COLUMNS.len());
    rec.set("id", id.to_string());
    rec.set("grp", ScalarValue::from(item.grp.clone()));
    rec.set("label", ScalarValue::from(item.label.clone()));
    rec.set("qty", ScalarValue::from(item.qty.clone()));
    rec
}
