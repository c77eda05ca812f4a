use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Liveness and dependency status for load balancers and operators.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` when every dependency is up, `degraded` otherwise.
    pub status: &'static str,
    pub version: &'static str,
    /// Logins and session checks fail with 503 while this is false.
    pub db_healthy: bool,
    /// Whether the audit writer is still subscribed to the bus. While false,
    /// audit entries are discarded.
    pub audit_persistence: bool,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = capa_db::health_check(&state.pool).await.is_ok();
    let audit_persistence = state.audit.subscriber_count() > 0;

    if !audit_persistence {
        tracing::warn!("Audit persistence is not subscribed; audit entries are being dropped");
    }

    Json(HealthResponse {
        status: if db_healthy && audit_persistence { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        audit_persistence,
    })
}

/// Root-level routes, outside `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
