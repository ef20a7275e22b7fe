//! HTTP handlers for kaunseling-api.
//!
//! One set of collection handlers serves every collection kind; the kind is
//! the first path segment after `/api/collections`.

pub mod attachments;
pub mod collections;
pub mod profile;
pub mod session;

use axum::extract::{Multipart, State};
use axum::Json;
use kaunseling_core::CollectionKind;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use crate::error::ApiError;
use crate::state::AppState;

/// Body of a comment request. A missing name falls back to the profile name
/// for administrators and the visitor label otherwise.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentBody {
    pub text: String,
    #[serde(default)]
    pub user_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReactionBody {
    pub emoji: String,
}

/// One file pulled out of a multipart upload.
#[derive(Debug)]
pub(crate) struct UploadedFile {
    pub name: String,
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

pub(crate) fn parse_kind(kind: &str) -> Result<CollectionKind, ApiError> {
    Ok(kind.parse::<CollectionKind>()?)
}

/// Read every part of a multipart body as a file.
pub(crate) async fn read_files(mut multipart: Multipart) -> Result<Vec<UploadedFile>, ApiError> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?
    {
        let name = field
            .file_name()
            .or_else(|| field.name())
            .unwrap_or("file")
            .to_string();
        let content_type = field.content_type().map(|s| s.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file data: {}", e)))?
            .to_vec();
        files.push(UploadedFile {
            name,
            data,
            content_type,
        });
    }
    Ok(files)
}

/// Liveness plus a few counters.
pub async fn health(State(state): State<AppState>) -> Json<JsonValue> {
    let dashboard = state.dashboard.lock().await;
    let records: usize = CollectionKind::ALL
        .iter()
        .map(|k| dashboard.collection(*k).len())
        .sum();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "records": records,
        "remoteMirror": dashboard.has_mirror(),
    }))
}
