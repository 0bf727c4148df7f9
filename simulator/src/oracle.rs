use std::collections::BTreeMap;

use sql_recordset::RecordSetError;

use crate::model::{Expected, Item, Op, TableModel};

pub(crate) struct Oracle;

impl Oracle {
    /// Compare what the batch returned with what the model predicted.
    pub(crate) fn check_outcome(
        op: &Op,
        expected: Expected,
        actual: &Result<usize, RecordSetError>,
    ) -> Result<(), String> {
        match (expected, actual) {
            (Expected::Affected(want), Ok(got)) if want == *got => Ok(()),
            (Expected::Affected(want), Ok(got)) => {
                Err(format!("{op}: expected {want} affected rows, batch reported {got}"))
            }
            (Expected::Affected(_), Err(err)) => Err(format!("{op}: unexpected error: {err}")),
            (Expected::Failure, Err(RecordSetError::StatementError { .. })) => Ok(()),
            (Expected::Failure, Err(err)) => Err(format!("{op}: wrong error kind: {err}")),
            (Expected::Failure, Ok(got)) => {
                Err(format!("{op}: expected a failure, batch reported {got} rows"))
            }
        }
    }

    /// Compare the table read back from the database with the model.
    pub(crate) fn check_table(
        model: &TableModel,
        actual: &BTreeMap<i64, Item>,
        in_transaction: bool,
    ) -> Result<(), String> {
        if in_transaction {
            return Err("connection left inside a transaction".to_string());
        }
        for (id, want) in &model.rows {
            match actual.get(id) {
                None => return Err(format!("row {id} missing from table")),
                Some(got) if got != want => {
                    return Err(format!("row {id} differs: model {want:?}, table {got:?}"));
                }
                Some(_) => {}
            }
        }
        if let Some(extra) = actual.keys().find(|id| !model.rows.contains_key(id)) {
            return Err(format!("row {extra} present in table but not in model"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sql_recordset::BatchOp;

    #[test]
    fn failure_must_be_a_statement_error() {
        let op = Op::Insert(Vec::new());
        let statement = Err(RecordSetError::StatementError {
            op: BatchOp::Insert,
            table: "t".to_string(),
            source: "UNIQUE constraint failed".into(),
        });
        assert!(Oracle::check_outcome(&op, Expected::Failure, &statement).is_ok());

        let config = Err(RecordSetError::ConfigError("x".to_string()));
        assert!(Oracle::check_outcome(&op, Expected::Failure, &config).is_err());
        assert!(Oracle::check_outcome(&op, Expected::Failure, &Ok(0)).is_err());
    }

    #[test]
    fn affected_counts_must_match() {
        let op = Op::Insert(Vec::new());
        assert!(Oracle::check_outcome(&op, Expected::Affected(2), &Ok(2)).is_ok());
        assert!(Oracle::check_outcome(&op, Expected::Affected(2), &Ok(1)).is_err());
    }

    #[test]
    fn table_differences_are_reported() {
        let model = TableModel::new();
        let mut actual = BTreeMap::new();
        assert!(Oracle::check_table(&model, &actual, false).is_ok());
        assert!(Oracle::check_table(&model, &actual, true).is_err());
        actual.insert(4, Item::default());
        let err = Oracle::check_table(&model, &actual, false).unwrap_err();
        assert!(err.contains("row 4"));
    }
}
