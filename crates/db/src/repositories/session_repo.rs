//! Repository for the `active_sessions` table.
//!
//! Rows are never deleted. Every revocation is guarded by
//! `revoked_at IS NULL`, which makes revocation terminal and idempotent.

use sqlx::PgPool;
use capa_core::types::{DbId, Timestamp};

use crate::models::session::{ActiveSession, CreateSession};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, session_token, user_id, user_agent, ip_address, created_at, \
                        last_active_at, expires_at, revoked_at, revoked_reason";

/// Provides registry operations for active sessions.
pub struct ActiveSessionRepo;

impl ActiveSessionRepo {
    /// Insert a new session, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateSession) -> Result<ActiveSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO active_sessions
                (session_token, user_id, user_agent, ip_address, created_at, last_active_at, expires_at)
             VALUES ($1, $2, $3, $4, $5, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ActiveSession>(&query)
            .bind(&input.session_token)
            .bind(input.user_id)
            .bind(&input.user_agent)
            .bind(&input.ip_address)
            .bind(input.created_at)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    /// Find a session by token, regardless of its state.
    pub async fn find_by_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<ActiveSession>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM active_sessions WHERE session_token = $1");
        sqlx::query_as::<_, ActiveSession>(&query)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// Live sessions for a user, oldest first (eviction order).
    pub async fn list_live_oldest_first(
        pool: &PgPool,
        user_id: DbId,
        now: Timestamp,
    ) -> Result<Vec<ActiveSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM active_sessions
             WHERE user_id = $1 AND revoked_at IS NULL AND expires_at > $2
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, ActiveSession>(&query)
            .bind(user_id)
            .bind(now)
            .fetch_all(pool)
            .await
    }

    /// Live sessions for a user, most recently active first.
    pub async fn list_live_recent_first(
        pool: &PgPool,
        user_id: DbId,
        now: Timestamp,
    ) -> Result<Vec<ActiveSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM active_sessions
             WHERE user_id = $1 AND revoked_at IS NULL AND expires_at > $2
             ORDER BY last_active_at DESC, id DESC"
        );
        sqlx::query_as::<_, ActiveSession>(&query)
            .bind(user_id)
            .bind(now)
            .fetch_all(pool)
            .await
    }

    /// Revoke the given sessions. Already-revoked rows are left untouched.
    pub async fn revoke_many(
        pool: &PgPool,
        ids: &[DbId],
        reason: &str,
        at: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "UPDATE active_sessions SET revoked_at = $2, revoked_reason = $3
             WHERE id = ANY($1) AND revoked_at IS NULL",
        )
        .bind(ids)
        .bind(at)
        .bind(reason)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Revoke a single session by token. Returns `true` if it was live-or-expired
    /// and not yet revoked.
    pub async fn revoke_by_token(
        pool: &PgPool,
        token: &str,
        reason: &str,
        at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE active_sessions SET revoked_at = $2, revoked_reason = $3
             WHERE session_token = $1 AND revoked_at IS NULL",
        )
        .bind(token)
        .bind(at)
        .bind(reason)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Revoke every unrevoked session of a user. Returns the count of revoked sessions.
    pub async fn revoke_all_for_user(
        pool: &PgPool,
        user_id: DbId,
        reason: &str,
        at: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE active_sessions SET revoked_at = $2, revoked_reason = $3
             WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(user_id)
        .bind(at)
        .bind(reason)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Update `last_active_at`. Does not touch revoked sessions.
    pub async fn touch(pool: &PgPool, token: &str, at: Timestamp) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE active_sessions SET last_active_at = $2
             WHERE session_token = $1 AND revoked_at IS NULL",
        )
        .bind(token)
        .bind(at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
