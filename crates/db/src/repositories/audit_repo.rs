//! Repository for the append-only `audit_logs` table.

use sqlx::PgPool;
use capa_core::types::DbId;

use crate::models::audit::{AuditLog, AuditQuery, CreateAuditLog};

/// Column list for `audit_logs` SELECT queries.
const COLUMNS: &str = "\
    id, user_id, user_email, action, entity_type, entity_id, \
    metadata, ip_address, user_agent, created_at";

/// Shared WHERE clause; each filter is skipped when its parameter is NULL.
const FILTER: &str = "\
    WHERE ($1::BIGINT IS NULL OR user_id = $1) \
      AND ($2::TEXT IS NULL OR action = $2) \
      AND ($3::TEXT IS NULL OR entity_type = $3) \
      AND ($4::BIGINT IS NULL OR entity_id = $4)";

/// Default page size for [`AuditLogRepo::query`].
pub const DEFAULT_PAGE_SIZE: i64 = 50;
/// Largest page size accepted by [`AuditLogRepo::query`].
pub const MAX_PAGE_SIZE: i64 = 500;

/// Provides insert and query operations for audit logs.
pub struct AuditLogRepo;

impl AuditLogRepo {
    /// Insert one audit entry, returning its ID.
    pub async fn insert(pool: &PgPool, entry: &CreateAuditLog) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "INSERT INTO audit_logs
                (user_id, user_email, action, entity_type, entity_id,
                 metadata, ip_address, user_agent, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING id",
        )
        .bind(entry.user_id)
        .bind(&entry.user_email)
        .bind(&entry.action)
        .bind(&entry.entity_type)
        .bind(entry.entity_id)
        .bind(&entry.metadata)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(entry.created_at)
        .fetch_one(pool)
        .await
    }

    /// Query audit logs, newest first, with filtering and pagination.
    pub async fn query(pool: &PgPool, params: &AuditQuery) -> Result<Vec<AuditLog>, sqlx::Error> {
        let (limit, offset) = page_bounds(params);
        let query = format!(
            "SELECT {COLUMNS} FROM audit_logs {FILTER}
             ORDER BY created_at DESC, id DESC
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(params.user_id)
            .bind(&params.action)
            .bind(&params.entity_type)
            .bind(params.entity_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count audit logs matching the filter (for pagination metadata).
    pub async fn count(pool: &PgPool, params: &AuditQuery) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*)::BIGINT FROM audit_logs {FILTER}");
        sqlx::query_scalar::<_, i64>(&query)
            .bind(params.user_id)
            .bind(&params.action)
            .bind(&params.entity_type)
            .bind(params.entity_id)
            .fetch_one(pool)
            .await
    }
}

/// Clamp the requested limit/offset to sane bounds.
pub fn page_bounds(params: &AuditQuery) -> (i64, i64) {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0).max(0);
    (limit, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_bounds_apply_defaults_and_clamps() {
        assert_eq!(page_bounds(&AuditQuery::default()), (50, 0));

        let params = AuditQuery {
            limit: Some(10_000),
            offset: Some(-3),
            ..AuditQuery::default()
        };
        assert_eq!(page_bounds(&params), (500, 0));

        let params = AuditQuery {
            limit: Some(0),
            ..AuditQuery::default()
        };
        assert_eq!(page_bounds(&params).0, 1);
    }
}
