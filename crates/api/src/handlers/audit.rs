//! Handler for querying the audit trail. Admin only.

use axum::extract::{Query, State};
use axum::Json;

use capa_db::models::audit::{AuditLogPage, AuditQuery};
use capa_db::repositories::audit_repo::page_bounds;
use capa_db::repositories::AuditLogRepo;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/admin/audit-logs
///
/// Filter by `user_id`, `action`, `entity_type`, `entity_id`; paginated
/// with `limit` / `offset`, newest first.
pub async fn query_audit_logs(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<AuditQuery>,
) -> AppResult<Json<DataResponse<AuditLogPage>>> {
    let items = AuditLogRepo::query(&state.pool, &params).await?;
    let total = AuditLogRepo::count(&state.pool, &params).await?;
    let (limit, offset) = page_bounds(&params);

    Ok(Json(DataResponse {
        data: AuditLogPage {
            items,
            total,
            limit,
            offset,
        },
    }))
}
