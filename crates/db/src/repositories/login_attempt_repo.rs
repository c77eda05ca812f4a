//! Repository for the append-only `login_attempts` table.

use sqlx::PgPool;
use capa_core::types::Timestamp;

use crate::models::login_attempt::{CreateLoginAttempt, LoginAttempt};

const COLUMNS: &str = "id, email, ip_address, success, created_at";

/// Append and window-count operations for login attempts.
pub struct LoginAttemptRepo;

impl LoginAttemptRepo {
    /// Append one attempt. Attempts are never updated afterwards.
    pub async fn insert(
        pool: &PgPool,
        input: &CreateLoginAttempt,
    ) -> Result<LoginAttempt, sqlx::Error> {
        let query = format!(
            "INSERT INTO login_attempts (email, ip_address, success, created_at)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LoginAttempt>(&query)
            .bind(&input.email)
            .bind(&input.ip_address)
            .bind(input.success)
            .bind(input.created_at)
            .fetch_one(pool)
            .await
    }

    /// Count attempts from `ip_address` with `created_at > since`, along with
    /// the oldest such attempt's timestamp.
    pub async fn window_stats(
        pool: &PgPool,
        ip_address: &str,
        since: Timestamp,
    ) -> Result<(i64, Option<Timestamp>), sqlx::Error> {
        sqlx::query_as::<_, (i64, Option<Timestamp>)>(
            "SELECT COUNT(*)::BIGINT, MIN(created_at)
             FROM login_attempts
             WHERE ip_address = $1 AND created_at > $2",
        )
        .bind(ip_address)
        .bind(since)
        .fetch_one(pool)
        .await
    }

    /// Delete attempts older than `cutoff`. Returns the number of deleted rows.
    pub async fn delete_older_than(pool: &PgPool, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM login_attempts WHERE created_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
