pub mod admin;
pub mod auth;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/login                          login (public)
/// /auth/logout                         revoke current session
/// /auth/me                             identity from token claims
/// /auth/change-password                self-service password change
/// /auth/sessions                       own live sessions
///
/// /admin/users/{id}                    deactivate (DELETE)
/// /admin/users/{id}/sessions           list, revoke all (GET, DELETE)
/// /admin/users/{id}/reset-password     reset password (POST)
/// /admin/sessions/{token}              revoke one session (DELETE)
/// /admin/audit-logs                    audit trail query (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
}
