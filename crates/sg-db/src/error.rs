//! Error types for sg-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Transaction begin/commit/rollback error (D003)
    #[error("[D003] Transaction failed: {0}")]
    TransactionError(String),

    /// Column value had an unexpected type (D004)
    #[error("[D004] Expected {expected} in column {column}, found {found}")]
    TypeMismatch {
        column: usize,
        expected: &'static str,
        found: String,
    },

    /// Row shorter than expected (D005)
    #[error("[D005] Row has no column {0}")]
    MissingColumn(usize),

    /// MySQL driver error with preserved source chain (D006)
    #[error("[D006] MySQL error: {0}")]
    MySql(#[from] mysql_async::Error),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;
