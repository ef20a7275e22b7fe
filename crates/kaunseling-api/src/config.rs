//! Server configuration from the environment.

use axum::http::HeaderValue;
use kaunseling_core::defaults::{
    ADMIN_PASSWORD, DATA_DIR, MAX_BODY_SIZE_BYTES, MAX_UPLOAD_BYTES, SERVER_HOST, SERVER_PORT, VISITOR_CODE,
};
use kaunseling_core::{AccessGate, IngestLimits};

const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

/// Everything the binary reads at startup.
///
/// Environment variables:
///   HOST, PORT                  - listen address (default 0.0.0.0:3000)
///   DATA_DIR                    - directory of collection documents (default ./data)
///   KAUNSELING_ADMIN_PASSWORD   - administrator password
///   KAUNSELING_VISITOR_CODE     - access code for the session registry
///   KAUNSELING_MAX_UPLOAD_BYTES - per-file upload cap (default 10 MiB)
///   MAX_BODY_SIZE_BYTES         - request body cap (default 64 MiB)
///   ALLOWED_ORIGINS             - comma-separated CORS origins
///
/// The remote mirror reads its own `KAUNSELING_REMOTE_*` variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: String,
    pub admin_password: String,
    pub visitor_code: String,
    pub max_upload_bytes: usize,
    pub max_body_bytes: usize,
    pub allowed_origins: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: SERVER_HOST.to_string(),
            port: SERVER_PORT,
            data_dir: DATA_DIR.to_string(),
            admin_password: ADMIN_PASSWORD.to_string(),
            visitor_code: VISITOR_CODE.to_string(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            max_body_bytes: MAX_BODY_SIZE_BYTES,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            data_dir: std::env::var("DATA_DIR").unwrap_or(defaults.data_dir),
            admin_password: std::env::var("KAUNSELING_ADMIN_PASSWORD")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.admin_password),
            visitor_code: std::env::var("KAUNSELING_VISITOR_CODE")
                .ok()
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.visitor_code),
            max_upload_bytes: std::env::var("KAUNSELING_MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
            max_body_bytes: std::env::var("MAX_BODY_SIZE_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_bytes),
            allowed_origins: std::env::var("ALLOWED_ORIGINS").unwrap_or(defaults.allowed_origins),
        }
    }

    pub fn gate(&self) -> AccessGate {
        AccessGate::new(self.admin_password.clone(), self.visitor_code.clone())
    }

    pub fn ingest_limits(&self) -> IngestLimits {
        IngestLimits::with_max_bytes(self.max_upload_bytes)
    }

    /// Parse the CORS origin list, dropping entries that are not valid header
    /// values. An empty setting falls back to the local development origins.
    pub fn cors_origins(&self) -> Vec<HeaderValue> {
        let source = if self.allowed_origins.trim().is_empty() {
            DEFAULT_ALLOWED_ORIGINS
        } else {
            self.allowed_origins.as_str()
        };

        source
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                match trimmed.parse::<HeaderValue>() {
                    Ok(v) => Some(v),
                    Err(e) => {
                        tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                        None
                    }
                }
            })
            .collect()
    }
}
