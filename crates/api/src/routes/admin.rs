//! Route definitions for the `/admin` resource.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{admin, audit};
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// All routes require the `admin` role (enforced by handler extractors).
///
/// ```text
/// DELETE /users/{id}                 -> deactivate_user
/// GET    /users/{id}/sessions        -> list_user_sessions
/// DELETE /users/{id}/sessions        -> revoke_user_sessions
/// POST   /users/{id}/reset-password  -> reset_password
/// DELETE /sessions/{token}           -> revoke_session
/// GET    /audit-logs                 -> query_audit_logs
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{id}", delete(admin::deactivate_user))
        .route(
            "/users/{id}/sessions",
            get(admin::list_user_sessions).delete(admin::revoke_user_sessions),
        )
        .route("/users/{id}/reset-password", post(admin::reset_password))
        .route("/sessions/{token}", delete(admin::revoke_session))
        .route("/audit-logs", get(audit::query_audit_logs))
}
