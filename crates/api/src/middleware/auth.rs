//! Bearer-token extractors for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use capa_auth::accounts::Actor;
use capa_auth::jwt::validate_token;
use capa_auth::validator::ValidatedSession;
use capa_auth::AuthError;
use capa_core::error::CoreError;
use capa_core::types::DbId;

use crate::client::ClientInfo;
use crate::error::AppError;
use crate::state::AppState;

/// Caller identity taken from a signed JWT in the `Authorization` header.
///
/// The session behind the token is NOT re-checked; use [`ValidSession`]
/// for anything that changes state.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    pub role: String,
    /// Session token carried in the `jti` claim.
    pub session_token: String,
    pub expires_at: i64,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
            session_token: claims.jti,
            expires_at: claims.exp,
        })
    }
}

/// A bearer token whose session passed [`SessionValidator::validate`](capa_auth::validator::SessionValidator::validate).
///
/// Role checks should use `session.user.role`, which is read from the
/// store on every request, rather than the role claim.
#[derive(Debug, Clone)]
pub struct ValidSession {
    pub claims: AuthUser,
    pub session: ValidatedSession,
    pub client: ClientInfo,
}

impl ValidSession {
    pub fn user_id(&self) -> DbId {
        self.session.user.user.id
    }

    pub fn role(&self) -> &str {
        &self.session.user.role
    }

    pub fn token(&self) -> &str {
        &self.session.session.session_token
    }

    /// The caller as recorded in audit entries.
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: Some(self.user_id()),
            email: Some(self.session.user.user.email.clone()),
            source_ip: Some(self.client.ip.clone()),
            user_agent: self.client.user_agent.clone(),
        }
    }
}

impl FromRequestParts<AppState> for ValidSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = AuthUser::from_request_parts(parts, state).await?;
        let client = ClientInfo::from_parts(parts, state.config.trust_proxy_headers).await;

        let session = state
            .auth
            .validator()
            .validate(&claims.session_token)
            .await?;

        if session.user.user.id != claims.user_id {
            tracing::warn!(
                claimed_user_id = claims.user_id,
                session_user_id = session.user.user.id,
                "Token subject does not own its session"
            );
            return Err(AuthError::SessionNotFound.into());
        }

        Ok(ValidSession {
            claims,
            session,
            client,
        })
    }
}
