//! Session liveness, cap eviction and validity rules.

use chrono::Duration;

use crate::types::Timestamp;

/// Revocation reasons written to `active_sessions.revoked_reason`.
pub mod revoke_reasons {
    pub const SESSION_CAP: &str = "session_cap";
    pub const PASSWORD_CHANGE: &str = "password_change";
    pub const ADMIN_REVOKE: &str = "admin_revoke";
    pub const LOGOUT: &str = "logout";
    pub const ACCOUNT_DEACTIVATED: &str = "account_deactivated";
}

/// A session is live iff it has not been revoked and has not expired.
pub fn is_live(revoked_at: Option<Timestamp>, expires_at: Timestamp, now: Timestamp) -> bool {
    revoked_at.is_none() && expires_at > now
}

/// How many of the oldest live sessions must be revoked before inserting one
/// more, so that at most `cap` remain live afterwards.
///
/// A cap of zero is treated as one: the new session always survives.
pub fn eviction_count(live: usize, cap: usize) -> usize {
    (live + 1).saturating_sub(cap.max(1)).min(live)
}

/// The fields of a session and its owner that decide validity.
#[derive(Debug, Clone, Copy)]
pub struct SessionFacts<'a> {
    pub created_at: Timestamp,
    pub last_active_at: Timestamp,
    pub expires_at: Timestamp,
    pub revoked_at: Option<Timestamp>,
    pub revoked_reason: Option<&'a str>,
    pub user_active: bool,
    pub password_changed_at: Option<Timestamp>,
}

/// Result of checking one session. The first failing rule wins, in the
/// order the variants are declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCheck<'a> {
    Revoked { reason: &'a str },
    Expired,
    Deactivated,
    /// The owner's password changed after this session was issued.
    PasswordChanged,
    /// `touch` is set when `last_active_at` is stale enough to be refreshed.
    Valid { touch: bool },
}

pub fn evaluate_session<'a>(
    facts: &SessionFacts<'a>,
    now: Timestamp,
    touch_interval: Duration,
) -> SessionCheck<'a> {
    if facts.revoked_at.is_some() {
        return SessionCheck::Revoked {
            reason: facts.revoked_reason.unwrap_or("unknown"),
        };
    }
    if facts.expires_at < now {
        return SessionCheck::Expired;
    }
    if !facts.user_active {
        return SessionCheck::Deactivated;
    }
    if facts
        .password_changed_at
        .is_some_and(|changed| changed > facts.created_at)
    {
        return SessionCheck::PasswordChanged;
    }
    SessionCheck::Valid {
        touch: now - facts.last_active_at > touch_interval,
    }
}
