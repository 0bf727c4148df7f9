use std::fmt;

use thiserror::Error;

#[cfg(feature = "sqlite")]
use rusqlite;

/// Driver-agnostic error carried as the source of the context variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The batch operation that was running when an error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchOp {
    Insert,
    Replace,
    Update,
    Delete,
}

impl BatchOp {
    /// SQL verb used for this operation.
    #[must_use]
    pub fn verb(self) -> &'static str {
        match self {
            BatchOp::Insert => "INSERT",
            BatchOp::Replace => "REPLACE",
            BatchOp::Update => "UPDATE",
            BatchOp::Delete => "DELETE",
        }
    }
}

impl fmt::Display for BatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

#[derive(Debug, Error)]
pub enum RecordSetError {
    #[error("Row decode error: {0}")]
    DecodeError(#[source] BoxError),

    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    #[error("{op} on `{table}` failed: {source}")]
    StatementError {
        op: BatchOp,
        table: String,
        #[source]
        source: BoxError,
    },

    #[error("{op} on `{table}` could not begin a transaction: {source}")]
    BeginError {
        op: BatchOp,
        table: String,
        #[source]
        source: BoxError,
    },

    #[error("{op} on `{table}` failed to commit: {source}")]
    CommitError {
        op: BatchOp,
        table: String,
        #[source]
        source: BoxError,
    },

    #[error("{op} on `{table}`: first record has no columns")]
    EmptyColumns { op: BatchOp, table: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),
}

impl RecordSetError {
    pub(crate) fn decode(err: impl Into<BoxError>) -> Self {
        RecordSetError::DecodeError(err.into())
    }

    pub(crate) fn statement(op: BatchOp, table: &str, source: BoxError) -> Self {
        RecordSetError::StatementError {
            op,
            table: table.to_owned(),
            source,
        }
    }
}
