//! Database error types.

use thiserror::Error;

use crate::transaction::TransactionKind;

/// Database error type.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema creation or reset error
    #[error("Schema error: {0}")]
    Schema(String),

    /// Invalid data error
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A transaction produced an output of the wrong shape for its kind.
    #[error("transaction {kind:?} produced unexpected output: {output}")]
    UnexpectedOutput {
        kind: TransactionKind,
        output: &'static str,
    },
}

/// Result type alias using DatabaseError.
pub type DatabaseResult<T> = Result<T, DatabaseError>;
