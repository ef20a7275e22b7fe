//! Remote mirror errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Remote reported error: {0}")]
    Remote(String),

    #[error("Invalid remote response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<SyncError> for kaunseling_core::Error {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::Config(msg) => kaunseling_core::Error::Config(msg),
            other => kaunseling_core::Error::Request(other.to_string()),
        }
    }
}
