//! Authentication limits.
//!
//! Every limit has a fixed default; the API binary may override any of them
//! from the environment at startup.

use chrono::Duration;

/// Sliding rate-limit window per source IP, in seconds.
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: i64 = 15 * 60;
/// Attempts allowed per source IP inside one window.
pub const DEFAULT_RATE_LIMIT_MAX_ATTEMPTS: i64 = 10;
/// Consecutive failures that lock an account.
pub const DEFAULT_LOCKOUT_THRESHOLD: i32 = 5;
/// How long a lock lasts, in seconds.
pub const DEFAULT_LOCKOUT_DURATION_SECS: i64 = 15 * 60;
/// Live sessions kept per user; the oldest are evicted beyond this.
pub const DEFAULT_MAX_SESSIONS_PER_USER: usize = 3;
/// Session lifetime, in seconds.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 24 * 60 * 60;
/// Minimum gap between two `last_active_at` writes, in seconds.
pub const DEFAULT_SESSION_TOUCH_INTERVAL_SECS: i64 = 5 * 60;

/// The full set of limits enforced by the rate limiter, lockout guard and
/// session registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthPolicy {
    pub rate_limit_window: Duration,
    pub rate_limit_max_attempts: i64,
    pub lockout_threshold: i32,
    pub lockout_duration: Duration,
    pub max_sessions_per_user: usize,
    pub session_ttl: Duration,
    pub session_touch_interval: Duration,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self {
            rate_limit_window: Duration::seconds(DEFAULT_RATE_LIMIT_WINDOW_SECS),
            rate_limit_max_attempts: DEFAULT_RATE_LIMIT_MAX_ATTEMPTS,
            lockout_threshold: DEFAULT_LOCKOUT_THRESHOLD,
            lockout_duration: Duration::seconds(DEFAULT_LOCKOUT_DURATION_SECS),
            max_sessions_per_user: DEFAULT_MAX_SESSIONS_PER_USER,
            session_ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
            session_touch_interval: Duration::seconds(DEFAULT_SESSION_TOUCH_INTERVAL_SECS),
        }
    }
}
