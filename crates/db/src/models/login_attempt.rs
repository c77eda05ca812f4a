//! Login attempt log model.

use sqlx::FromRow;
use capa_core::types::{DbId, Timestamp};

/// One row of the append-only `login_attempts` log.
#[derive(Debug, Clone, FromRow)]
pub struct LoginAttempt {
    pub id: DbId,
    pub email: String,
    pub ip_address: String,
    pub success: bool,
    pub created_at: Timestamp,
}

/// DTO for appending an attempt. `email` is expected lower-cased.
#[derive(Debug, Clone)]
pub struct CreateLoginAttempt {
    pub email: String,
    pub ip_address: String,
    pub success: bool,
    pub created_at: Timestamp,
}
