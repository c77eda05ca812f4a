use std::str::FromStr;

use capa_auth::jwt::JwtConfig;
use capa_core::policy::AuthPolicy;

/// Default retention for the login attempt log, in days.
pub const DEFAULT_LOGIN_ATTEMPT_RETENTION_DAYS: i64 = 30;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Seconds to wait for background tasks after shutdown (default: `5`).
    pub shutdown_timeout_secs: u64,
    /// JWT signing configuration.
    pub jwt: JwtConfig,
    /// Rate limit, lockout and session limits.
    pub auth_policy: AuthPolicy,
    /// Login attempts older than this are purged by the retention task.
    pub login_attempt_retention_days: i64,
    /// Take the client address from `X-Forwarded-For` / `X-Real-IP`
    /// (default: `false`). Only enable behind a proxy that overwrites them.
    pub trust_proxy_headers: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                 |
    /// |---------------------------------|-------------------------|
    /// | `HOST`                          | `0.0.0.0`               |
    /// | `PORT`                          | `3000`                  |
    /// | `CORS_ORIGINS`                  | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`          | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`         | `5`                     |
    /// | `LOGIN_ATTEMPT_RETENTION_DAYS`  | `30`                    |
    /// | `TRUST_PROXY_HEADERS`           | `false`                 |
    ///
    /// plus the `AUTH_*` overrides read by [`auth_policy_from`] and
    /// `JWT_SECRET` (see [`JwtConfig::from_env`]).
    ///
    /// # Panics
    ///
    /// Panics on unparseable values, so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let lookup = |name: &str| std::env::var(name).ok();

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = parse_or(&lookup, "PORT", 3000);

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30);
        let shutdown_timeout_secs: u64 = parse_or(&lookup, "SHUTDOWN_TIMEOUT_SECS", 5);

        let auth_policy = auth_policy_from(&lookup);
        let login_attempt_retention_days = retention_days(
            parse_or(
                &lookup,
                "LOGIN_ATTEMPT_RETENTION_DAYS",
                DEFAULT_LOGIN_ATTEMPT_RETENTION_DAYS,
            ),
            &auth_policy,
        );

        let trust_proxy_headers = parse_flag(&lookup, "TRUST_PROXY_HEADERS");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt: JwtConfig::from_env(),
            auth_policy,
            login_attempt_retention_days,
            trust_proxy_headers,
        }
    }
}

/// Build an [`AuthPolicy`] from `lookup`, falling back to the defaults.
///
/// | Env Var                             | Default |
/// |-------------------------------------|---------|
/// | `AUTH_RATE_LIMIT_WINDOW_SECS`       | `900`   |
/// | `AUTH_RATE_LIMIT_MAX_ATTEMPTS`      | `10`    |
/// | `AUTH_LOCKOUT_THRESHOLD`            | `5`     |
/// | `AUTH_LOCKOUT_DURATION_SECS`        | `900`   |
/// | `AUTH_MAX_SESSIONS_PER_USER`        | `3`     |
/// | `AUTH_SESSION_TTL_SECS`             | `86400` |
/// | `AUTH_SESSION_TOUCH_INTERVAL_SECS`  | `300`   |
pub fn auth_policy_from(lookup: &impl Fn(&str) -> Option<String>) -> AuthPolicy {
    use capa_core::policy::*;
    use chrono::Duration;

    AuthPolicy {
        rate_limit_window: Duration::seconds(parse_or(
            lookup,
            "AUTH_RATE_LIMIT_WINDOW_SECS",
            DEFAULT_RATE_LIMIT_WINDOW_SECS,
        )),
        rate_limit_max_attempts: parse_or(
            lookup,
            "AUTH_RATE_LIMIT_MAX_ATTEMPTS",
            DEFAULT_RATE_LIMIT_MAX_ATTEMPTS,
        ),
        lockout_threshold: parse_or(lookup, "AUTH_LOCKOUT_THRESHOLD", DEFAULT_LOCKOUT_THRESHOLD),
        lockout_duration: Duration::seconds(parse_or(
            lookup,
            "AUTH_LOCKOUT_DURATION_SECS",
            DEFAULT_LOCKOUT_DURATION_SECS,
        )),
        max_sessions_per_user: parse_or(
            lookup,
            "AUTH_MAX_SESSIONS_PER_USER",
            DEFAULT_MAX_SESSIONS_PER_USER,
        ),
        session_ttl: Duration::seconds(parse_or(
            lookup,
            "AUTH_SESSION_TTL_SECS",
            DEFAULT_SESSION_TTL_SECS,
        )),
        session_touch_interval: Duration::seconds(parse_or(
            lookup,
            "AUTH_SESSION_TOUCH_INTERVAL_SECS",
            DEFAULT_SESSION_TOUCH_INTERVAL_SECS,
        )),
    }
}

/// Retention never drops below the rate-limit window, rounded up to whole days.
fn retention_days(requested: i64, policy: &AuthPolicy) -> i64 {
    let window_secs = policy.rate_limit_window.num_seconds();
    let min_days = (window_secs + 86_399) / 86_400;
    requested.max(min_days.max(1))
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{name} must be a valid number: {e}")),
        None => default,
    }
}

fn parse_flag(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> bool {
    match lookup(name).as_deref().map(str::trim) {
        None | Some("") => false,
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => panic!("{name} must be true or false, got {raw:?}"),
        },
    }
}
