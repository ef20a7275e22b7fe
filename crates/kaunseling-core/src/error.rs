//! Error types for kaunseling.

use thiserror::Error;

/// Result type alias using kaunseling's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for kaunseling operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input (missing required field, empty comment, rejected upload)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Shared secret did not match
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Operation requires administrator mode
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Key-value store operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
