//! Attachment ingestion.
//!
//! Uploaded files are embedded directly in the record as `data:` URIs. The
//! effective content type is resolved in order:
//! 1. the declared type, when it is a well-formed MIME type
//! 2. magic byte detection via `infer`
//! 3. the file extension
//! 4. `application/octet-stream`

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use once_cell::sync::Lazy;
use tracing::warn;

use crate::defaults::{ALLOWED_MIME_PREFIXES, FALLBACK_MIME, MAX_UPLOAD_BYTES};
use crate::error::{Error, Result};
use crate::models::Attachment;

/// Extensions of the formats the dashboard accepts.
static EXTENSION_MIME: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("jpg", "image/jpeg"),
        ("jpeg", "image/jpeg"),
        ("png", "image/png"),
        ("gif", "image/gif"),
        ("webp", "image/webp"),
        ("bmp", "image/bmp"),
        ("heic", "image/heic"),
        ("svg", "image/svg+xml"),
        ("pdf", "application/pdf"),
    ]
    .into_iter()
    .collect()
});

/// Size and type limits applied to every uploaded file.
#[derive(Debug, Clone)]
pub struct IngestLimits {
    pub max_bytes: usize,
    pub allowed_prefixes: Vec<String>,
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            max_bytes: MAX_UPLOAD_BYTES,
            allowed_prefixes: ALLOWED_MIME_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl IngestLimits {
    /// Default limits with a different size cap.
    pub fn with_max_bytes(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            ..Self::default()
        }
    }

    fn allows(&self, mime: &str) -> bool {
        self.allowed_prefixes.is_empty() || self.allowed_prefixes.iter().any(|p| mime.starts_with(p.as_str()))
    }
}

/// A file the batch did not turn into an attachment.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SkippedFile {
    pub name: String,
    pub reason: String,
}

/// Result of ingesting several files at once.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct IngestOutcome {
    pub attachments: Vec<Attachment>,
    pub skipped: Vec<SkippedFile>,
}

/// Resolve the effective content type of an upload. A declared generic
/// `application/octet-stream` counts as undeclared.
pub fn detect_content_type(filename: &str, data: &[u8], declared: Option<&str>) -> String {
    if let Some(declared) = declared
        .map(str::trim)
        .filter(|d| is_valid_mime_type(d) && !d.eq_ignore_ascii_case(FALLBACK_MIME))
    {
        return declared.to_ascii_lowercase();
    }

    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }

    if let Some((_, ext)) = filename.rsplit_once('.') {
        if let Some(mime) = EXTENSION_MIME.get(ext.to_ascii_lowercase().as_str()) {
            return (*mime).to_string();
        }
    }

    FALLBACK_MIME.to_string()
}

/// `type/subtype` with token characters only.
pub fn is_valid_mime_type(mime: &str) -> bool {
    let Some((media_type, subtype)) = mime.split_once('/') else {
        return false;
    };
    if media_type.is_empty() || subtype.is_empty() || subtype.contains('/') {
        return false;
    }
    let is_token_char =
        |c: char| c.is_ascii_alphanumeric() || matches!(c, '!' | '#' | '$' | '&' | '-' | '^' | '_' | '.' | '+');
    media_type.chars().all(is_token_char) && subtype.chars().all(is_token_char)
}

/// Strip path components and control characters from an uploaded filename.
fn display_name(filename: &str) -> Option<String> {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let cleaned: String = name.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_uppercase())
}

pub fn encode_data_uri(mime: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(data))
}

/// Split a `data:` URI into its content type and decoded bytes.
pub fn decode_data_uri(url: &str) -> Result<(String, Vec<u8>)> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| Error::InvalidInput("not a data URI".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::InvalidInput("data URI has no payload".to_string()))?;

    let (mime, is_base64) = match meta.strip_suffix(";base64") {
        Some(mime) => (mime, true),
        None => (meta, false),
    };
    // Parameters such as ;charset=utf-8 are kept in the content type.
    let mime = if mime.is_empty() { "text/plain" } else { mime };

    let bytes = if is_base64 {
        STANDARD
            .decode(payload.trim())
            .map_err(|e| Error::InvalidInput(format!("invalid base64 payload: {}", e)))?
    } else {
        payload.as_bytes().to_vec()
    };
    Ok((mime.to_string(), bytes))
}

/// Turn one uploaded file into an attachment.
pub fn ingest_file(filename: &str, data: &[u8], declared_mime: Option<&str>, limits: &IngestLimits) -> Result<Attachment> {
    if data.is_empty() {
        return Err(Error::InvalidInput(format!("{} is empty", filename)));
    }
    if data.len() > limits.max_bytes {
        return Err(Error::InvalidInput(format!(
            "{} exceeds maximum size of {} bytes",
            filename, limits.max_bytes
        )));
    }

    let mime = detect_content_type(filename, data, declared_mime);
    if !limits.allows(&mime) {
        return Err(Error::InvalidInput(format!("{} has unsupported type {}", filename, mime)));
    }

    let mut attachment = Attachment::from_url(encode_data_uri(&mime, data));
    attachment.name = display_name(filename);
    attachment.mime_type = Some(mime);
    Ok(attachment)
}

/// Ingest several files into independent attachments, in order. Files that
/// fail the limits are skipped and reported rather than failing the batch.
pub fn ingest_batch<'a, I>(files: I, limits: &IngestLimits) -> IngestOutcome
where
    I: IntoIterator<Item = (&'a str, &'a [u8], Option<&'a str>)>,
{
    let mut outcome = IngestOutcome::default();
    for (filename, data, declared) in files {
        match ingest_file(filename, data, declared, limits) {
            Ok(attachment) => outcome.attachments.push(attachment),
            Err(e) => {
                warn!(
                    subsystem = "ingest",
                    file_name = %filename,
                    size_bytes = data.len(),
                    error = %e,
                    "Skipping uploaded file"
                );
                outcome.skipped.push(SkippedFile {
                    name: filename.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }
    outcome
}
