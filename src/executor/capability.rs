//! The minimal "something I can run SQL against" surface.
//!
//! Both a raw connection and an open transaction implement [`Executor`]; batch
//! operations are written once against it and never branch on which one they got.

use crate::error::BoxError;
use crate::types::ScalarValue;

/// A statement prepared once and executed many times with different arguments.
pub trait PreparedStatement {
    /// Execute with positional `args`, returning the affected-row count.
    ///
    /// # Errors
    /// Returns the driver error if binding or execution fails.
    fn execute(&mut self, args: &[ScalarValue]) -> Result<usize, BoxError>;
}

/// Prepare/execute/run capability shared by connections and transactions.
pub trait Executor {
    /// Prepare `sql` for repeated execution.
    ///
    /// # Errors
    /// Returns the driver error if the statement cannot be prepared.
    fn prepare<'s>(&'s self, sql: &str) -> Result<Box<dyn PreparedStatement + 's>, BoxError>;

    /// Run `sql` once for its effect, returning the affected-row count.
    ///
    /// # Errors
    /// Returns the driver error if preparation or execution fails.
    fn run(&self, sql: &str, args: &[ScalarValue]) -> Result<usize, BoxError>;
}

/// An open transaction whose lifecycle the holder controls.
pub trait Transaction: Executor {
    fn as_executor(&self) -> &dyn Executor;

    /// # Errors
    /// Returns the driver error if the commit fails.
    fn commit(self: Box<Self>) -> Result<(), BoxError>;

    /// # Errors
    /// Returns the driver error if the rollback fails.
    fn rollback(self: Box<Self>) -> Result<(), BoxError>;
}

/// A raw connection that can open transactions.
pub trait Connection: Executor {
    /// Begin a transaction on this connection.
    ///
    /// # Errors
    /// Returns the driver error if the transaction cannot be started.
    fn begin(&mut self) -> Result<Box<dyn Transaction + '_>, BoxError>;

    /// Whether a transaction is already open on this connection. This must be a
    /// local check; it is consulted before any database interaction.
    fn in_transaction(&self) -> bool;
}
