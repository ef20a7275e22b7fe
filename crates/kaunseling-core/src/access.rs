//! Shared-secret access gate.
//!
//! Two flags per session: administrator mode (unlocked by the admin password)
//! and the session-registry unlock (by the visitor access code). Checks are
//! plaintext equality with no lockout; this is a convenience gate, not a
//! security boundary.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::defaults::{ADMIN_PASSWORD, VISITOR_CODE};
use crate::error::{Error, Result};

/// Per-session flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub is_owner: bool,
    pub sessions_unlocked: bool,
}

impl SessionState {
    /// Whether counseling session entries may be read.
    pub fn can_read_sessions(&self) -> bool {
        self.is_owner || self.sessions_unlocked
    }

    /// Fail with `Forbidden` unless administrator mode is on.
    pub fn require_owner(&self) -> Result<()> {
        if self.is_owner {
            Ok(())
        } else {
            Err(Error::Forbidden("administrator mode required".to_string()))
        }
    }
}

/// The two configured secrets.
#[derive(Debug, Clone)]
pub struct AccessGate {
    admin_password: String,
    visitor_code: String,
}

impl Default for AccessGate {
    fn default() -> Self {
        Self::new(ADMIN_PASSWORD, VISITOR_CODE)
    }
}

impl AccessGate {
    pub fn new(admin_password: impl Into<String>, visitor_code: impl Into<String>) -> Self {
        Self {
            admin_password: admin_password.into(),
            visitor_code: visitor_code.into(),
        }
    }

    /// True when either secret is still the built-in default.
    pub fn uses_default_secrets(&self) -> bool {
        self.admin_password == ADMIN_PASSWORD || self.visitor_code == VISITOR_CODE
    }

    /// Enter administrator mode. The password is compared exactly.
    pub fn login(&self, session: &mut SessionState, password: &str) -> Result<()> {
        if password != self.admin_password {
            warn!(subsystem = "access", "Administrator login rejected");
            return Err(Error::Unauthorized("incorrect password".to_string()));
        }
        session.is_owner = true;
        info!(subsystem = "access", "Administrator mode enabled");
        Ok(())
    }

    /// Unlock the session registry. The code is uppercased before comparison
    /// and administrators pass without one.
    pub fn unlock_sessions(&self, session: &mut SessionState, code: &str) -> Result<()> {
        if session.is_owner || code.trim().to_uppercase() == self.visitor_code {
            session.sessions_unlocked = true;
            return Ok(());
        }
        warn!(subsystem = "access", "Session registry unlock rejected");
        Err(Error::Unauthorized("incorrect access code".to_string()))
    }

    /// Clear both flags.
    pub fn logout(&self, session: &mut SessionState) {
        *session = SessionState::default();
    }
}
