//! Administrator mode and session-registry access.

use axum::{extract::State, http::HeaderMap, Json};
use kaunseling_core::SessionState;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::{session_token, AppState};

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UnlockBody {
    pub code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: Option<String>,
    #[serde(flatten)]
    pub state: SessionState,
}

/// Enter administrator mode. Returns the token to send in `x-session-token`.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginBody>,
) -> Result<Json<SessionResponse>, ApiError> {
    let token = session_token(&headers);
    let mut session = state.session(&headers).await;
    state.gate.login(&mut session, &body.password)?;
    let token = state.sessions.save(token, session).await;
    Ok(Json(SessionResponse {
        token: Some(token),
        state: session,
    }))
}

/// Unlock the counseling session registry with the visitor code.
pub async fn unlock(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<UnlockBody>,
) -> Result<Json<SessionResponse>, ApiError> {
    let token = session_token(&headers);
    let mut session = state.session(&headers).await;
    state.gate.unlock_sessions(&mut session, &body.code)?;
    let token = state.sessions.save(token, session).await;
    Ok(Json(SessionResponse {
        token: Some(token),
        state: session,
    }))
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Json<SessionResponse> {
    let mut session = state.session(&headers).await;
    state.gate.logout(&mut session);
    if let Some(token) = session_token(&headers) {
        state.sessions.remove(token).await;
    }
    Json(SessionResponse { token: None, state: session })
}

pub async fn current(State(state): State<AppState>, headers: HeaderMap) -> Json<SessionResponse> {
    let session = state.session(&headers).await;
    let token = match session_token(&headers) {
        Some(t) if session != SessionState::default() => Some(t.to_string()),
        _ => None,
    };
    Json(SessionResponse { token, state: session })
}
