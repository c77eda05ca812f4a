//! Handlers for the `/auth` resource (login, logout, self-service).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use capa_auth::accounts::actor_entry;
use capa_auth::jwt::issue_access_token;
use capa_auth::verifier::LoginRequest;
use capa_core::audit::{actions, entity_types, AuditSink};
use capa_core::clock::Clock;
use capa_core::roles::{can_investigate, can_review};
use capa_core::sessions::revoke_reasons;
use capa_core::types::{DbId, Timestamp};
use capa_db::models::session::SessionSummary;

use crate::client::ClientInfo;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, ValidSession};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/change-password`.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordBody {
    pub current_password: String,
    pub new_password: String,
}

/// Successful login response.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: Timestamp,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// Response for `GET /auth/me`.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: DbId,
    pub role: String,
    pub can_investigate: bool,
    pub can_review: bool,
    /// Token expiry (UTC Unix timestamp).
    pub expires_at: i64,
}

#[derive(Debug, Serialize)]
pub struct OwnSession {
    #[serde(flatten)]
    pub session: SessionSummary,
    /// Whether this is the session making the request.
    pub current: bool,
}

#[derive(Debug, Serialize)]
pub struct PasswordChanged {
    pub revoked_sessions: u64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Authenticate with email + password. Returns a bearer token whose `jti`
/// is the new session's token.
pub async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(input): Json<LoginBody>,
) -> AppResult<Json<AuthResponse>> {
    if input.email.trim().is_empty() || input.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".into(),
        ));
    }

    let identity = state
        .auth
        .verifier()
        .login(LoginRequest {
            email: &input.email,
            password: &input.password,
            source_ip: &client.ip,
            user_agent: client.user_agent.as_deref(),
        })
        .await?;

    let issued_at = state.auth.clock().now().timestamp();
    let access_token = issue_access_token(&identity, issued_at, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    Ok(Json(AuthResponse {
        access_token,
        token_type: "Bearer",
        expires_at: identity.expires_at,
        user: UserInfo {
            id: identity.user_id,
            name: identity.name,
            email: identity.email,
            role: identity.role,
        },
    }))
}

/// POST /api/v1/auth/logout
///
/// Revoke the calling session. Returns 204 No Content.
pub async fn logout(State(state): State<AppState>, session: ValidSession) -> AppResult<StatusCode> {
    state
        .auth
        .sessions()
        .revoke_session(session.token(), revoke_reasons::LOGOUT)
        .await?;

    state.audit.record(
        actor_entry(actions::USER_LOGOUT, state.auth.clock().now(), &session.actor())
            .with_entity(entity_types::SESSION, session.session.session.id),
    );
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me
///
/// Identity and capabilities from the token alone.
pub async fn me(user: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        can_investigate: can_investigate(&user.role),
        can_review: can_review(&user.role),
        user_id: user.user_id,
        role: user.role,
        expires_at: user.expires_at,
    })
}

/// POST /api/v1/auth/change-password
///
/// Change the caller's own password. Every session of the caller,
/// including this one, is revoked.
pub async fn change_password(
    State(state): State<AppState>,
    session: ValidSession,
    Json(input): Json<ChangePasswordBody>,
) -> AppResult<Json<DataResponse<PasswordChanged>>> {
    let revoked_sessions = state
        .auth
        .accounts()
        .change_own_password(
            session.user_id(),
            &input.current_password,
            &input.new_password,
            &session.actor(),
        )
        .await?;

    Ok(Json(DataResponse {
        data: PasswordChanged { revoked_sessions },
    }))
}

/// GET /api/v1/auth/sessions
///
/// The caller's live sessions, most recently active first.
pub async fn list_own_sessions(
    State(state): State<AppState>,
    session: ValidSession,
) -> AppResult<Json<DataResponse<Vec<OwnSession>>>> {
    let sessions = state
        .auth
        .sessions()
        .list_active_sessions(session.user_id())
        .await?;

    let data = sessions
        .iter()
        .map(|s| OwnSession {
            session: SessionSummary::from(s),
            current: s.session_token == session.token(),
        })
        .collect();

    Ok(Json(DataResponse { data }))
}
