use super::capability::{Connection, Executor, Transaction};

/// Target for batch execution (connection or transaction).
///
/// Given a connection, the batch owns a transaction it begins, commits, or rolls
/// back itself. Given a transaction, the batch runs inside it and leaves its
/// lifecycle to the caller, so several batches can share one outer transaction.
pub enum BatchTarget<'a> {
    Connection(&'a mut dyn Connection),
    Transaction(&'a dyn Executor),
}

impl<'a, C: Connection + 'a> From<&'a mut C> for BatchTarget<'a> {
    fn from(conn: &'a mut C) -> Self {
        BatchTarget::Connection(conn)
    }
}

impl<'a, T: Transaction + 'a> From<&'a T> for BatchTarget<'a> {
    fn from(tx: &'a T) -> Self {
        BatchTarget::Transaction(tx.as_executor())
    }
}
