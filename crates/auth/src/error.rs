//! Typed authentication outcomes.

use capa_core::types::DbId;

/// Every way a login, session check or credential change can fail.
///
/// All variants except [`AuthError::Unavailable`] and [`AuthError::Internal`]
/// are expected outcomes, not faults.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Too many login attempts. Retry after {retry_after_ms} ms")]
    RateLimited { retry_after_ms: i64 },

    #[error("Account temporarily locked. Retry after {retry_after_ms} ms")]
    AccountLocked { retry_after_ms: i64 },

    /// Unknown account, inactive account and wrong password all map here.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Session revoked: {reason}")]
    SessionRevoked { reason: String },

    #[error("Session expired")]
    SessionExpired,

    #[error("User account deactivated")]
    AccountDeactivated,

    #[error("Password changed after this session was created")]
    PasswordChangedSinceIssue,

    #[error("Password does not meet the password policy: {}", .0.join("; "))]
    WeakPassword(Vec<String>),

    #[error("User {0} not found")]
    UnknownUser(DbId),

    /// The store could not be reached or failed mid-operation.
    #[error("Credential store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// `true` for outcomes that mean "this session can no longer be used";
    /// the caller should send the client back to the login page.
    pub fn is_session_rejection(&self) -> bool {
        matches!(
            self,
            AuthError::SessionNotFound
                | AuthError::SessionRevoked { .. }
                | AuthError::SessionExpired
                | AuthError::AccountDeactivated
                | AuthError::PasswordChangedSinceIssue
        )
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
