//! Error types for cove.

use thiserror::Error;

/// Common error type for cove operations.
#[derive(Error, Debug)]
pub enum CoveError {
    /// Database error.
    ///
    /// Wraps errors from the relational store, including transaction
    /// failures. Errors from sqlx are converted automatically.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error from blob storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Invalid argument for an operation (self-referential move,
    /// non-positive id where a positive one is required, empty name).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A folder move that would make a folder its own ancestor.
    #[error("move rejected: target is inside the folder being moved")]
    CycleRejected,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for CoveError {
    fn from(e: sqlx::Error) -> Self {
        CoveError::Database(e.to_string())
    }
}

/// Result type alias for cove operations.
pub type Result<T> = std::result::Result<T, CoveError>;
