//! Handlers for the `/admin` resource (session and account management).
//!
//! All handlers require the `admin` role via [`RequireAdmin`].

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use capa_auth::accounts::actor_entry;
use capa_core::audit::{actions, entity_types, AuditSink};
use capa_core::clock::Clock;
use capa_core::error::CoreError;
use capa_core::sessions::revoke_reasons;
use capa_core::types::DbId;
use capa_db::models::session::SessionSummary;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /admin/users/{id}/reset-password`.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct RevokedCount {
    pub revoked_sessions: u64,
}

#[derive(Debug, Serialize)]
pub struct RevokeResult {
    /// `false` when the session had already been revoked.
    pub revoked: bool,
}

/// GET /api/v1/admin/users/{id}/sessions
pub async fn list_user_sessions(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(user_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<SessionSummary>>>> {
    let sessions = state.auth.sessions().list_active_sessions(user_id).await?;
    Ok(Json(DataResponse {
        data: sessions.iter().map(SessionSummary::from).collect(),
    }))
}

/// DELETE /api/v1/admin/users/{id}/sessions
///
/// Force-logout a user everywhere.
pub async fn revoke_user_sessions(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(user_id): Path<DbId>,
) -> AppResult<Json<DataResponse<RevokedCount>>> {
    let revoked_sessions = state
        .auth
        .sessions()
        .revoke_all_sessions(user_id, revoke_reasons::ADMIN_REVOKE)
        .await?;

    state.audit.record(
        actor_entry(
            actions::USER_REVOKE_ALL_SESSIONS,
            state.auth.clock().now(),
            &admin.actor(),
        )
        .with_entity(entity_types::USER, user_id)
        .with_metadata(serde_json::json!({ "revoked_sessions": revoked_sessions })),
    );

    Ok(Json(DataResponse {
        data: RevokedCount { revoked_sessions },
    }))
}

/// DELETE /api/v1/admin/sessions/{token}
pub async fn revoke_session(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(token): Path<String>,
) -> AppResult<Json<DataResponse<RevokeResult>>> {
    let registry = state.auth.sessions();
    let session = registry
        .find_session(&token)
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: "Session",
            key: token.clone(),
        })?;

    let revoked = registry
        .revoke_session(&token, revoke_reasons::ADMIN_REVOKE)
        .await?;

    if revoked {
        state.audit.record(
            actor_entry(
                actions::USER_REVOKE_SESSION,
                state.auth.clock().now(),
                &admin.actor(),
            )
            .with_entity(entity_types::SESSION, session.id)
            .with_metadata(serde_json::json!({ "owner_user_id": session.user_id })),
        );
    }

    Ok(Json(DataResponse {
        data: RevokeResult { revoked },
    }))
}

/// POST /api/v1/admin/users/{id}/reset-password
///
/// Set a new password and revoke all of the user's sessions.
pub async fn reset_password(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(user_id): Path<DbId>,
    Json(input): Json<ResetPasswordRequest>,
) -> AppResult<Json<DataResponse<RevokedCount>>> {
    let revoked_sessions = state
        .auth
        .accounts()
        .change_password(user_id, &input.new_password, &admin.actor())
        .await?;

    Ok(Json(DataResponse {
        data: RevokedCount { revoked_sessions },
    }))
}

/// DELETE /api/v1/admin/users/{id}
///
/// Deactivate a user and revoke all of their sessions. Admins cannot
/// deactivate themselves.
pub async fn deactivate_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(user_id): Path<DbId>,
) -> AppResult<Json<DataResponse<RevokedCount>>> {
    if admin.user_id() == user_id {
        return Err(AppError::Core(CoreError::Validation(
            "Administrators cannot deactivate their own account".into(),
        )));
    }

    let revoked_sessions = state
        .auth
        .accounts()
        .deactivate_user(user_id, &admin.actor())
        .await?;

    Ok(Json(DataResponse {
        data: RevokedCount { revoked_sessions },
    }))
}
