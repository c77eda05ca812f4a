//! Active session model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use capa_core::sessions::SessionFacts;
use capa_core::types::{DbId, Timestamp};

/// A row from the `active_sessions` table.
///
/// `session_token` is the JTI embedded in the client's bearer token.
#[derive(Debug, Clone, FromRow)]
pub struct ActiveSession {
    pub id: DbId,
    pub session_token: String,
    pub user_id: DbId,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: Timestamp,
    pub last_active_at: Timestamp,
    pub expires_at: Timestamp,
    pub revoked_at: Option<Timestamp>,
    pub revoked_reason: Option<String>,
}

impl ActiveSession {
    /// Live iff not revoked and not yet expired at `now`.
    pub fn is_live(&self, now: Timestamp) -> bool {
        capa_core::sessions::is_live(self.revoked_at, self.expires_at, now)
    }

    /// Combine this session with its owner's status for validation.
    pub fn facts(&self, user_active: bool, password_changed_at: Option<Timestamp>) -> SessionFacts<'_> {
        SessionFacts {
            created_at: self.created_at,
            last_active_at: self.last_active_at,
            expires_at: self.expires_at,
            revoked_at: self.revoked_at,
            revoked_reason: self.revoked_reason.as_deref(),
            user_active,
            password_changed_at,
        }
    }
}

/// Session listing for session-management views.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: DbId,
    pub session_token: String,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: Timestamp,
    pub last_active_at: Timestamp,
    pub expires_at: Timestamp,
}

impl From<&ActiveSession> for SessionSummary {
    fn from(s: &ActiveSession) -> Self {
        Self {
            id: s.id,
            session_token: s.session_token.clone(),
            user_agent: s.user_agent.clone(),
            ip_address: s.ip_address.clone(),
            created_at: s.created_at,
            last_active_at: s.last_active_at,
            expires_at: s.expires_at,
        }
    }
}

/// DTO for inserting a session row.
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub session_token: String,
    pub user_id: DbId,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}
