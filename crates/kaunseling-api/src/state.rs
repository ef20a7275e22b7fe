//! Shared server state and the per-client session registry.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::HeaderMap;
use kaunseling_core::defaults::SESSION_HEADER;
use kaunseling_core::{AccessGate, IngestLimits, SessionState};
use kaunseling_store::Dashboard;
use tokio::sync::{Mutex, RwLock};

/// In-memory map of session token to flags. Lives as long as the process.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionState>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flags for a token; unknown tokens are plain visitors.
    pub async fn get(&self, token: &str) -> SessionState {
        self.sessions.read().await.get(token).copied().unwrap_or_default()
    }

    /// Store flags under an existing token, or mint a new one.
    pub async fn save(&self, token: Option<&str>, state: SessionState) -> String {
        let token = match token {
            Some(t) if self.sessions.read().await.contains_key(t) => t.to_string(),
            _ => uuid::Uuid::new_v4().simple().to_string(),
        };
        self.sessions.write().await.insert(token.clone(), state);
        token
    }

    pub async fn remove(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Mutex<Dashboard>>,
    pub gate: AccessGate,
    pub sessions: Arc<SessionRegistry>,
    pub limits: IngestLimits,
}

impl AppState {
    pub fn new(dashboard: Dashboard, gate: AccessGate, limits: IngestLimits) -> Self {
        Self::with_shared(Arc::new(Mutex::new(dashboard)), gate, limits)
    }

    /// Build around a dashboard that is also held by the remote poller.
    pub fn with_shared(dashboard: Arc<Mutex<Dashboard>>, gate: AccessGate, limits: IngestLimits) -> Self {
        Self {
            dashboard,
            gate,
            sessions: Arc::new(SessionRegistry::new()),
            limits,
        }
    }

    /// Flags of the session named by the request's token header.
    pub async fn session(&self, headers: &HeaderMap) -> SessionState {
        match session_token(headers) {
            Some(token) => self.sessions.get(token).await,
            None => SessionState::default(),
        }
    }
}

pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
