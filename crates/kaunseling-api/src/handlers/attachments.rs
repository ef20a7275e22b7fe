//! Attachment upload, replacement, removal, download and interactions.
//!
//! Attachments are addressed by record and slot. The slot is the attachment
//! list's field name (`oprImages`, `files`, `scheduleImages`) or `day:<DAY>`
//! for a weekly duty day.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use kaunseling_core::{decode_data_uri, ingest_batch, ingest_file, DutyDetails, IngestOutcome};
use kaunseling_store::InteractionTarget;
use serde_json::{json, Value as JsonValue};
use tracing::info;

use super::{parse_kind, read_files, CommentBody, ReactionBody};
use crate::error::ApiError;
use crate::state::AppState;

type SlotPath = (String, String, String);
type AttachmentPath = (String, String, String, String);

/// Upload one or more files into a slot. Files over the size cap or of an
/// unsupported type are reported under `skipped`; the rest are appended. A
/// batch where nothing is accepted is a 400.
pub async fn upload(
    State(state): State<AppState>,
    Path((kind, id, slot)): Path<SlotPath>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&kind)?;
    let session = state.session(&headers).await;
    session.require_owner()?;

    let files = read_files(multipart).await?;
    if files.is_empty() {
        return Err(ApiError::BadRequest("No file uploaded".to_string()));
    }
    let outcome = ingest_batch(
        files
            .iter()
            .map(|f| (f.name.as_str(), f.data.as_slice(), f.content_type.as_deref())),
        &state.limits,
    );

    let IngestOutcome { attachments, skipped } = outcome;
    if attachments.is_empty() {
        let reasons: Vec<String> = skipped.iter().map(|s| s.reason.clone()).collect();
        return Err(ApiError::BadRequest(format!("No file accepted: {}", reasons.join("; "))));
    }
    let added = state
        .dashboard
        .lock()
        .await
        .add_attachments(kind, &id, &slot, attachments, &session)
        .await?;
    info!(
        subsystem = "api",
        collection = %kind,
        slot = %slot,
        added = added.len(),
        skipped = skipped.len(),
        "Attachments uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({ "attachments": added, "skipped": skipped })),
    ))
}

/// Swap the file behind an attachment, keeping its id.
pub async fn replace(
    State(state): State<AppState>,
    Path((kind, id, slot, attachment_id)): Path<AttachmentPath>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&kind)?;
    let session = state.session(&headers).await;
    session.require_owner()?;

    let files = read_files(multipart).await?;
    let file = files
        .first()
        .ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;
    let replacement = ingest_file(&file.name, &file.data, file.content_type.as_deref(), &state.limits)?;

    let replaced = state
        .dashboard
        .lock()
        .await
        .replace_attachment(kind, &id, &slot, &attachment_id, replacement, &session)
        .await?;
    Ok(Json(replaced))
}

pub async fn remove(
    State(state): State<AppState>,
    Path((kind, id, slot, attachment_id)): Path<AttachmentPath>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&kind)?;
    let session = state.session(&headers).await;
    let removed = state
        .dashboard
        .lock()
        .await
        .remove_attachment(kind, &id, &slot, &attachment_id, &session)
        .await?;
    Ok(Json(removed))
}

/// Decoded file bytes. Attachments that point at an external URL redirect;
/// a URL that cannot be sent as a `Location` header is a 400.
pub async fn content(
    State(state): State<AppState>,
    Path((kind, id, slot, attachment_id)): Path<AttachmentPath>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let kind = parse_kind(&kind)?;
    let session = state.session(&headers).await;
    let attachment = state
        .dashboard
        .lock()
        .await
        .attachment(kind, &id, &slot, &attachment_id, &session)?;

    if !attachment.url.starts_with("data:") {
        let location = HeaderValue::try_from(attachment.url.as_str())
            .map_err(|_| ApiError::BadRequest(format!("attachment {} has an unusable url", attachment_id)))?;
        return Ok((StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, location)]).into_response());
    }
    let (mime, bytes) = decode_data_uri(&attachment.url)?;
    Ok(([(header::CONTENT_TYPE, mime)], bytes).into_response())
}

pub async fn set_duty_details(
    State(state): State<AppState>,
    Path((kind, id, slot, attachment_id)): Path<AttachmentPath>,
    headers: HeaderMap,
    Json(details): Json<DutyDetails>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&kind)?;
    let session = state.session(&headers).await;
    let updated = state
        .dashboard
        .lock()
        .await
        .set_duty_details(kind, &id, &slot, &attachment_id, details, &session)
        .await?;
    Ok(Json(updated))
}

// =============================================================================
// INTERACTIONS
// =============================================================================

fn attachment_target(path: AttachmentPath) -> Result<InteractionTarget, ApiError> {
    let (kind, record_id, slot, attachment_id) = path;
    Ok(InteractionTarget::Attachment {
        kind: parse_kind(&kind)?,
        record_id,
        slot,
        attachment_id,
    })
}

pub async fn add_comment(
    State(state): State<AppState>,
    Path(path): Path<AttachmentPath>,
    headers: HeaderMap,
    Json(body): Json<CommentBody>,
) -> Result<impl IntoResponse, ApiError> {
    let target = attachment_target(path)?;
    let session = state.session(&headers).await;
    let comment = state
        .dashboard
        .lock()
        .await
        .add_comment(&target, &body.text, body.user_name.as_deref(), &session)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path((kind, id, slot, attachment_id, comment_id)): Path<(String, String, String, String, String)>,
    headers: HeaderMap,
) -> Result<Json<JsonValue>, ApiError> {
    let target = attachment_target((kind, id, slot, attachment_id))?;
    let session = state.session(&headers).await;
    let removed = state
        .dashboard
        .lock()
        .await
        .delete_comment(&target, &comment_id, &session)
        .await?;
    Ok(Json(json!({ "removed": removed })))
}

pub async fn add_reaction(
    State(state): State<AppState>,
    Path(path): Path<AttachmentPath>,
    headers: HeaderMap,
    Json(body): Json<ReactionBody>,
) -> Result<impl IntoResponse, ApiError> {
    let target = attachment_target(path)?;
    let session = state.session(&headers).await;
    let reaction = state
        .dashboard
        .lock()
        .await
        .add_reaction(&target, &body.emoji, &session)
        .await?;
    Ok(Json(reaction))
}
