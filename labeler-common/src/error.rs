//! Common error types for the labeler

use thiserror::Error;

/// Common result type for labeler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the bookkeeping core and the HTTP layer
#[derive(Error, Debug)]
pub enum Error {
    /// Image file missing or index empty
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed label request or unusable path
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Undo requested with nothing recorded
    #[error("No labels to undo")]
    EmptyHistory,

    /// Path escapes the dataset root
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Unexpected failure while mutating state
    #[error("Internal error: {0}")]
    Internal(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
