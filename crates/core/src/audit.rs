//! Audit action constants, the [`AuditEntry`] record and the [`AuditSink`]
//! contract.
//!
//! Security-relevant events are handed to an [`AuditSink`] without waiting
//! for them to be stored. A sink must never block the caller and must never
//! surface a storage failure back to it.

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Action constants
// ---------------------------------------------------------------------------

/// Known action names for audit entries.
pub mod actions {
    pub const USER_LOGIN: &str = "user.login";
    pub const USER_LOGIN_FAILED: &str = "user.login_failed";
    pub const USER_LOGOUT: &str = "user.logout";
    pub const USER_RESET_PASSWORD: &str = "user.reset_password";
    pub const USER_DEACTIVATE: &str = "user.deactivate";
    pub const USER_REVOKE_SESSION: &str = "user.revoke_session";
    pub const USER_REVOKE_ALL_SESSIONS: &str = "user.revoke_all_sessions";
}

/// Entity type names used in `entity_type`.
pub mod entity_types {
    pub const USER: &str = "user";
    pub const SESSION: &str = "session";
}

/// Fields that are redacted from audit metadata before storage.
pub const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "token",
    "secret",
    "authorization",
    "credential",
    "session_token",
];

/// Replace the value of any object key matching [`SENSITIVE_FIELDS`] with
/// `"[REDACTED]"`, recursing into nested objects and arrays.
pub fn redact_sensitive_fields(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.iter()
                .map(|(key, val)| {
                    let lower = key.to_lowercase();
                    if SENSITIVE_FIELDS.iter().any(|f| lower.contains(f)) {
                        (key.clone(), serde_json::Value::from("[REDACTED]"))
                    } else {
                        (key.clone(), redact_sensitive_fields(val))
                    }
                })
                .collect(),
        ),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(redact_sensitive_fields).collect())
        }
        other => other.clone(),
    }
}

// ---------------------------------------------------------------------------
// AuditEntry
// ---------------------------------------------------------------------------

/// One security-relevant event.
///
/// Built with [`AuditEntry::new`] and the `with_*` methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub user_id: Option<DbId>,
    pub user_email: Option<String>,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<DbId>,
    pub metadata: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub occurred_at: Timestamp,
}

impl AuditEntry {
    pub fn new(action: impl Into<String>, occurred_at: Timestamp) -> Self {
        Self {
            user_id: None,
            user_email: None,
            action: action.into(),
            entity_type: None,
            entity_id: None,
            metadata: serde_json::Value::Object(Default::default()),
            ip_address: None,
            user_agent: None,
            occurred_at,
        }
    }

    pub fn with_user(mut self, user_id: DbId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.user_email = Some(email.into());
        self
    }

    pub fn with_entity(mut self, entity_type: impl Into<String>, entity_id: DbId) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_ip(mut self, ip: Option<&str>) -> Self {
        self.ip_address = ip.map(str::to_string);
        self
    }

    pub fn with_user_agent(mut self, user_agent: Option<&str>) -> Self {
        self.user_agent = user_agent.map(str::to_string);
        self
    }
}

// ---------------------------------------------------------------------------
// AuditSink
// ---------------------------------------------------------------------------

/// Fire-and-forget recorder of audit entries.
pub trait AuditSink: Send + Sync {
    /// Hand off `entry`. Returns immediately; failures are the sink's problem.
    fn record(&self, entry: AuditEntry);
}

impl<S: AuditSink + ?Sized> AuditSink for std::sync::Arc<S> {
    fn record(&self, entry: AuditEntry) {
        (**self).record(entry)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
