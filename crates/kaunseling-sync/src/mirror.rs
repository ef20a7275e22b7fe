//! HTTP remote mirror.

use async_trait::async_trait;
use kaunseling_core::defaults::REMOTE_ENTRIES_PATH;
use kaunseling_core::{RemoteMirror, Result};
use reqwest::Client;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info};

use crate::config::SyncConfig;
use crate::error::SyncError;

/// Mirror that talks to an `/entries` endpoint.
pub struct HttpMirror {
    client: Client,
    config: SyncConfig,
}

impl HttpMirror {
    pub fn new(config: SyncConfig) -> std::result::Result<Self, SyncError> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SyncError::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "sync",
            endpoint = %config.endpoint,
            timeout_secs = config.timeout_secs,
            "Initializing remote mirror"
        );
        Ok(Self { client, config })
    }

    /// Create from environment variables; `Ok(None)` when no endpoint is set.
    pub fn from_env() -> std::result::Result<Option<Self>, SyncError> {
        SyncConfig::from_env().map(Self::new).transpose()
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    fn entries_url(&self) -> String {
        format!(
            "{}{}",
            self.config.endpoint.trim_end_matches('/'),
            REMOTE_ENTRIES_PATH
        )
    }

    /// `POST /entries` with `{module, data}`.
    pub async fn save_entry(&self, module: &str, data: &JsonValue) -> std::result::Result<JsonValue, SyncError> {
        let response = self
            .client
            .post(self.entries_url())
            .json(&json!({ "module": module, "data": data }))
            .send()
            .await?;
        let out = read_body(response).await?;
        debug!(subsystem = "sync", module, "Remote entry saved");
        Ok(out)
    }

    /// `GET /entries[?module=]`. A missing `results` field means no entries.
    pub async fn get_entries(&self, module: Option<&str>) -> std::result::Result<Vec<JsonValue>, SyncError> {
        let mut request = self.client.get(self.entries_url());
        if let Some(module) = module {
            request = request.query(&[("module", module)]);
        }
        let out = read_body(request.send().await?).await?;
        match out.get("results") {
            None | Some(JsonValue::Null) => Ok(Vec::new()),
            Some(JsonValue::Array(items)) => Ok(items.clone()),
            Some(other) => Err(SyncError::InvalidResponse(format!(
                "results is not an array: {}",
                other
            ))),
        }
    }
}

/// Parse the JSON body; non-2xx or an `error` field is a failure.
async fn read_body(response: reqwest::Response) -> std::result::Result<JsonValue, SyncError> {
    let status = response.status();
    let text = response.text().await?;
    let body: Option<JsonValue> = serde_json::from_str(&text).ok();
    let remote_error = body
        .as_ref()
        .and_then(|b| b.get("error"))
        .filter(|e| !e.is_null())
        .map(|e| e.as_str().map(str::to_string).unwrap_or_else(|| e.to_string()));

    if !status.is_success() {
        return Err(SyncError::Status {
            status: status.as_u16(),
            message: remote_error.unwrap_or(text),
        });
    }
    if let Some(message) = remote_error {
        return Err(SyncError::Remote(message));
    }
    body.ok_or_else(|| SyncError::InvalidResponse("response is not JSON".to_string()))
}

#[async_trait]
impl RemoteMirror for HttpMirror {
    async fn push(&self, module: &str, data: &JsonValue) -> Result<()> {
        self.save_entry(module, data).await?;
        Ok(())
    }

    async fn fetch(&self, module: &str) -> Result<Vec<JsonValue>> {
        Ok(self.get_entries(Some(module)).await?)
    }
}
