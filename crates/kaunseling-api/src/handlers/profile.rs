//! Counselor profile: identity, mood, KPIs, Holland images and the two
//! schedule attachment lists.

use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use kaunseling_core::{ingest_batch, IngestOutcome, KpiKind, Profile, ProfileList, UserEmotion};
use kaunseling_store::InteractionTarget;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use super::{read_files, CommentBody, ReactionBody};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EmotionBody {
    pub emoji: String,
    pub label: String,
}

#[derive(Debug, Deserialize)]
pub struct KpiBody {
    pub kind: KpiKind,
    pub value: f64,
}

#[derive(Debug, Deserialize)]
pub struct HollandBody {
    #[serde(default)]
    pub url: String,
}

fn parse_list(list: &str) -> Result<ProfileList, ApiError> {
    Ok(list.parse::<ProfileList>()?)
}

pub async fn get_profile(State(state): State<AppState>) -> Json<Profile> {
    Json(state.dashboard.lock().await.profile().clone())
}

/// Merge the body's fields into the profile.
pub async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(patch): Json<JsonValue>,
) -> Result<Json<Profile>, ApiError> {
    let session = state.session(&headers).await;
    let mut dashboard = state.dashboard.lock().await;
    let profile = dashboard.update_profile(&patch, &session).await?.clone();
    Ok(Json(profile))
}

pub async fn set_emotion(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<EmotionBody>,
) -> Result<Json<UserEmotion>, ApiError> {
    let session = state.session(&headers).await;
    let emotion = state
        .dashboard
        .lock()
        .await
        .set_emotion(&body.emoji, &body.label, &session)
        .await?;
    Ok(Json(emotion))
}

pub async fn update_kpi(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<KpiBody>,
) -> Result<Json<Profile>, ApiError> {
    let session = state.session(&headers).await;
    let mut dashboard = state.dashboard.lock().await;
    let profile = dashboard.update_kpi(body.kind, body.value, &session).await?.clone();
    Ok(Json(profile))
}

/// Set the image for a Holland code; an empty url clears it.
pub async fn set_holland_image(
    State(state): State<AppState>,
    Path(code): Path<String>,
    headers: HeaderMap,
    Json(body): Json<HollandBody>,
) -> Result<Json<Profile>, ApiError> {
    let session = state.session(&headers).await;
    let mut dashboard = state.dashboard.lock().await;
    let profile = dashboard.set_holland_image(&code, &body.url, &session).await?.clone();
    Ok(Json(profile))
}

pub async fn list_attachments(
    State(state): State<AppState>,
    Path(list): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let list = parse_list(&list)?;
    let dashboard = state.dashboard.lock().await;
    Ok(Json(dashboard.profile().list(list).to_vec()))
}

pub async fn upload(
    State(state): State<AppState>,
    Path(list): Path<String>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let list = parse_list(&list)?;
    let session = state.session(&headers).await;
    session.require_owner()?;

    let files = read_files(multipart).await?;
    let IngestOutcome { attachments, skipped } = ingest_batch(
        files
            .iter()
            .map(|f| (f.name.as_str(), f.data.as_slice(), f.content_type.as_deref())),
        &state.limits,
    );
    if attachments.is_empty() {
        let reasons: Vec<String> = skipped.iter().map(|s| s.reason.clone()).collect();
        return Err(ApiError::BadRequest(format!("No file accepted: {}", reasons.join("; "))));
    }

    let added = state
        .dashboard
        .lock()
        .await
        .add_profile_attachments(list, attachments, &session)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "attachments": added, "skipped": skipped })),
    ))
}

pub async fn remove(
    State(state): State<AppState>,
    Path((list, attachment_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let list = parse_list(&list)?;
    let session = state.session(&headers).await;
    let removed = state
        .dashboard
        .lock()
        .await
        .remove_profile_attachment(list, &attachment_id, &session)
        .await?;
    Ok(Json(removed))
}

fn profile_target(list: &str, attachment_id: String) -> Result<InteractionTarget, ApiError> {
    Ok(InteractionTarget::ProfileAttachment {
        list: parse_list(list)?,
        attachment_id,
    })
}

pub async fn add_comment(
    State(state): State<AppState>,
    Path((list, attachment_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<CommentBody>,
) -> Result<impl IntoResponse, ApiError> {
    let target = profile_target(&list, attachment_id)?;
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
    Path((list, attachment_id, comment_id)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<Json<JsonValue>, ApiError> {
    let target = profile_target(&list, attachment_id)?;
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
    Path((list, attachment_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<ReactionBody>,
) -> Result<impl IntoResponse, ApiError> {
    let target = profile_target(&list, attachment_id)?;
    let session = state.session(&headers).await;
    let reaction = state
        .dashboard
        .lock()
        .await
        .add_reaction(&target, &body.emoji, &session)
        .await?;
    Ok(Json(reaction))
}
