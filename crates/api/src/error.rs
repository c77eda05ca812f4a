use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use capa_auth::AuthError;
use capa_core::error::CoreError;
use capa_core::lockout::ACCOUNT_LOCKED_REASON;
use capa_core::rate_limit::RATE_LIMITED_REASON;

/// Where a client whose session was rejected should go next.
pub const LOGIN_REDIRECT: &str = "/login";

/// Application-level error type for HTTP handlers.
///
/// Implements [`IntoResponse`] to produce consistent JSON error bodies of
/// the form `{ "error": ..., "code": ... }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An authentication outcome from `capa_auth`.
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Auth(err) => return auth_error_response(err),

            AppError::Core(core) => match core {
                CoreError::NotFound { entity, key } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} {key} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
            },

            AppError::Database(err) => {
                tracing::error!(error = %err, "Database error");
                internal()
            }

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

/// Map an [`AuthError`] to its HTTP response.
///
/// Store failures are reported as 503 and never look like bad credentials.
fn auth_error_response(err: &AuthError) -> Response {
    match err {
        AuthError::RateLimited { retry_after_ms } => {
            let body = json!({
                "error": RATE_LIMITED_REASON,
                "code": "RATE_LIMITED",
                "retry_after_ms": retry_after_ms,
            });
            let mut response = (StatusCode::TOO_MANY_REQUESTS, axum::Json(body)).into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, retry_after_header(*retry_after_ms));
            response
        }
        AuthError::AccountLocked { retry_after_ms } => {
            let body = json!({
                "error": ACCOUNT_LOCKED_REASON,
                "code": "ACCOUNT_LOCKED",
                "retry_after_ms": retry_after_ms,
            });
            (StatusCode::LOCKED, axum::Json(body)).into_response()
        }
        AuthError::InvalidCredentials => simple(
            StatusCode::UNAUTHORIZED,
            "INVALID_CREDENTIALS",
            err.to_string(),
        ),
        e if e.is_session_rejection() => {
            let body = json!({
                "error": e.to_string(),
                "code": "SESSION_INVALID",
                "redirect": LOGIN_REDIRECT,
            });
            (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
        }
        AuthError::WeakPassword(rules) => {
            let body = json!({
                "error": "Password does not meet the password policy",
                "code": "VALIDATION_ERROR",
                "details": rules,
            });
            (StatusCode::BAD_REQUEST, axum::Json(body)).into_response()
        }
        AuthError::UnknownUser(_) => simple(StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string()),
        AuthError::Unavailable(e) => {
            tracing::error!(error = %e, "Credential store unavailable");
            simple(
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                "Authentication is temporarily unavailable".to_string(),
            )
        }
        _ => {
            tracing::error!(error = %err, "Internal authentication error");
            let (status, code, message) = internal();
            simple(status, code, message)
        }
    }
}

fn simple(status: StatusCode, code: &str, message: String) -> Response {
    (status, axum::Json(json!({ "error": message, "code": code }))).into_response()
}

/// `Retry-After` is whole seconds, rounded up.
fn retry_after_header(retry_after_ms: i64) -> HeaderValue {
    let secs = (retry_after_ms.max(0) + 999) / 1000;
    HeaderValue::from(secs)
}
