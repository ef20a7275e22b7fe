//! Remote mirror configuration.

use std::time::Duration;

use kaunseling_core::defaults::{REMOTE_POLL_SECS, REMOTE_TIMEOUT_SECS};

use crate::error::SyncError;

/// Endpoint and timing of the remote mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Base URL; `/entries` is appended.
    pub endpoint: String,
    pub timeout_secs: u64,
    pub poll_secs: u64,
}

impl SyncConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout_secs: REMOTE_TIMEOUT_SECS,
            poll_secs: REMOTE_POLL_SECS,
        }
    }

    /// Read from the environment. `None` when `KAUNSELING_REMOTE_URL` is unset
    /// or empty, in which case no network call is ever made.
    ///
    /// - `KAUNSELING_REMOTE_URL`: base URL of the mirror
    /// - `KAUNSELING_REMOTE_TIMEOUT_SECS`: per-request timeout (default 15)
    /// - `KAUNSELING_REMOTE_POLL_SECS`: refresh interval (default 300)
    pub fn from_env() -> Option<Self> {
        let endpoint = std::env::var("KAUNSELING_REMOTE_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())?;

        Some(Self {
            endpoint,
            timeout_secs: std::env::var("KAUNSELING_REMOTE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(REMOTE_TIMEOUT_SECS),
            poll_secs: std::env::var("KAUNSELING_REMOTE_POLL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(REMOTE_POLL_SECS),
        })
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(SyncError::Config(format!(
                "remote endpoint must be an http(s) URL: {}",
                self.endpoint
            )));
        }
        if self.poll_secs == 0 {
            return Err(SyncError::Config("poll interval must be positive".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_secs)
    }
}
