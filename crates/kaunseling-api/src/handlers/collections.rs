//! Record CRUD for every collection kind, plus guestbook threads.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use kaunseling_core::{CollectionKind, SumbanganCategory};
use kaunseling_store::InteractionTarget;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use super::{parse_kind, CommentBody, ReactionBody};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Filter by category (`KURIKULUM`, `HEM`, ...). Case-insensitive.
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KindInfo {
    pub kind: &'static str,
    pub storage_key: &'static str,
    pub remote_module: Option<&'static str>,
    pub read_gated: bool,
    pub visitor_writable: bool,
    pub count: usize,
}

/// Every collection kind with its storage key and current size.
pub async fn list_kinds(State(state): State<AppState>) -> Json<Vec<KindInfo>> {
    let dashboard = state.dashboard.lock().await;
    let kinds = CollectionKind::ALL
        .iter()
        .map(|kind| KindInfo {
            kind: kind.as_str(),
            storage_key: kind.storage_key(),
            remote_module: kind.remote_module(),
            read_gated: kind.read_gated(),
            visitor_writable: kind.visitor_writable(),
            count: dashboard.collection(*kind).len(),
        })
        .collect();
    Json(kinds)
}

pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    let dashboard = state.dashboard.lock().await;
    Json(dashboard.stats())
}

fn parse_category(category: &str) -> Result<SumbanganCategory, ApiError> {
    serde_json::from_value(JsonValue::String(category.trim().to_uppercase()))
        .map_err(|_| ApiError::BadRequest(format!("Unknown category: {}", category)))
}

/// List a collection, newest first.
pub async fn list_records(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
) -> Result<Json<JsonValue>, ApiError> {
    let kind = parse_kind(&kind)?;
    let session = state.session(&headers).await;
    let dashboard = state.dashboard.lock().await;

    let Some(category) = query.category.as_deref().filter(|c| !c.trim().is_empty()) else {
        return Ok(Json(dashboard.list(kind, &session)?));
    };

    if kind == CollectionKind::Bureaus {
        let records = dashboard.bureaus_by_category(parse_category(category)?);
        let value = serde_json::to_value(records).map_err(kaunseling_core::Error::from)?;
        return Ok(Json(value));
    }

    let wanted = category.trim().to_uppercase();
    let all = dashboard.list(kind, &session)?;
    let filtered: Vec<JsonValue> = all
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter(|r| r.get("category").and_then(JsonValue::as_str) == Some(wanted.as_str()))
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    Ok(Json(JsonValue::Array(filtered)))
}

pub async fn create_record(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    headers: HeaderMap,
    Json(body): Json<JsonValue>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&kind)?;
    let session = state.session(&headers).await;
    let created = state.dashboard.lock().await.create(kind, body, &session).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_record(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<JsonValue>, ApiError> {
    let kind = parse_kind(&kind)?;
    let session = state.session(&headers).await;
    let record = state.dashboard.lock().await.get(kind, &id, &session)?;
    Ok(Json(record))
}

/// Shallow merge of the body's fields into the record.
pub async fn update_record(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(patch): Json<JsonValue>,
) -> Result<Json<JsonValue>, ApiError> {
    let kind = parse_kind(&kind)?;
    let session = state.session(&headers).await;
    let updated = state
        .dashboard
        .lock()
        .await
        .update(kind, &id, &patch, &session)
        .await?;
    Ok(Json(updated))
}

pub async fn replace_record(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(record): Json<JsonValue>,
) -> Result<Json<JsonValue>, ApiError> {
    let kind = parse_kind(&kind)?;
    let session = state.session(&headers).await;
    let replaced = state
        .dashboard
        .lock()
        .await
        .replace(kind, &id, record, &session)
        .await?;
    Ok(Json(replaced))
}

/// Remove a record and everything nested under it. Returns the removed record.
pub async fn delete_record(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<JsonValue>, ApiError> {
    let kind = parse_kind(&kind)?;
    let session = state.session(&headers).await;
    let removed = state.dashboard.lock().await.delete(kind, &id, &session).await?;
    Ok(Json(removed))
}

// =============================================================================
// RECORD-LEVEL THREADS (guestbook entries)
// =============================================================================

fn record_target(kind: &str, id: String) -> Result<InteractionTarget, ApiError> {
    Ok(InteractionTarget::Record {
        kind: parse_kind(kind)?,
        record_id: id,
    })
}

pub async fn add_record_comment(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<CommentBody>,
) -> Result<impl IntoResponse, ApiError> {
    let target = record_target(&kind, id)?;
    let session = state.session(&headers).await;
    let comment = state
        .dashboard
        .lock()
        .await
        .add_comment(&target, &body.text, body.user_name.as_deref(), &session)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn delete_record_comment(
    State(state): State<AppState>,
    Path((kind, id, comment_id)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<Json<JsonValue>, ApiError> {
    let target = record_target(&kind, id)?;
    let session = state.session(&headers).await;
    let removed = state
        .dashboard
        .lock()
        .await
        .delete_comment(&target, &comment_id, &session)
        .await?;
    Ok(Json(json!({ "removed": removed })))
}

pub async fn add_record_reaction(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<ReactionBody>,
) -> Result<impl IntoResponse, ApiError> {
    let target = record_target(&kind, id)?;
    let session = state.session(&headers).await;
    let reaction = state
        .dashboard
        .lock()
        .await
        .add_reaction(&target, &body.emoji, &session)
        .await?;
    Ok(Json(reaction))
}
