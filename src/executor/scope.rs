use crate::error::{BatchOp, RecordSetError};

use super::capability::Executor;
use super::targets::BatchTarget;

/// Atomicity boundary for one batch operation.
///
/// The operation and table are carried only to give begin/commit failures the
/// same context as statement failures.
#[derive(Debug, Clone, Copy)]
pub struct TxScope<'t> {
    op: BatchOp,
    table: &'t str,
}

impl<'t> TxScope<'t> {
    #[must_use]
    pub fn new(op: BatchOp, table: &'t str) -> Self {
        Self { op, table }
    }

    /// Run `work` atomically against `target`.
    ///
    /// For [`BatchTarget::Connection`] a transaction is begun, committed when
    /// `work` succeeds and rolled back when it fails; a rollback failure is logged
    /// and the original error returned. For [`BatchTarget::Transaction`] `work`
    /// runs directly on the caller's transaction, which is never committed or
    /// rolled back here.
    ///
    /// # Errors
    /// - `RecordSetError::InvalidHandle` if the connection already has an open
    ///   transaction, before any database interaction.
    /// - `RecordSetError::BeginError` / `RecordSetError::CommitError` for
    ///   transaction lifecycle failures.
    /// - Whatever `work` returns.
    pub fn run<R, F>(&self, target: BatchTarget<'_>, work: F) -> Result<R, RecordSetError>
    where
        F: FnOnce(&dyn Executor) -> Result<R, RecordSetError>,
    {
        let conn = match target {
            BatchTarget::Transaction(tx) => {
                tracing::debug!(op = %self.op, table = self.table, "running inside caller transaction");
                return work(tx);
            }
            BatchTarget::Connection(conn) => conn,
        };

        if conn.in_transaction() {
            return Err(RecordSetError::InvalidHandle(format!(
                "{} on `{}`: connection already has an open transaction; pass the transaction instead",
                self.op, self.table
            )));
        }

        let tx = conn.begin().map_err(|source| RecordSetError::BeginError {
            op: self.op,
            table: self.table.to_owned(),
            source,
        })?;
        tracing::debug!(op = %self.op, table = self.table, "began transaction");

        let outcome = work(tx.as_executor());
        match outcome {
            Ok(value) => {
                tx.commit().map_err(|source| RecordSetError::CommitError {
                    op: self.op,
                    table: self.table.to_owned(),
                    source,
                })?;
                tracing::debug!(op = %self.op, table = self.table, "committed transaction");
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(op = %self.op, table = self.table, error = %err, "rolling back transaction");
                if let Err(rollback_err) = tx.rollback() {
                    tracing::error!(
                        op = %self.op,
                        table = self.table,
                        error = %rollback_err,
                        "rollback failed"
                    );
                }
                Err(err)
            }
        }
    }
}
