//! Domain errors shared by the HTTP layer and the store-backed services.

/// Errors that carry no authentication semantics of their own.
///
/// Authentication outcomes (rate limiting, lockout, session invalidation)
/// are modelled separately by `capa_auth::AuthError`.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// `key` is whatever identified the row: a numeric id or a session token.
    #[error("Entity not found: {entity} {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a missing row addressed by numeric id.
    pub fn not_found(entity: &'static str, id: crate::types::DbId) -> Self {
        Self::NotFound {
            entity,
            key: id.to_string(),
        }
    }
}
