//! Per-IP sliding-window rate limiter.

use capa_core::clock::Clock;
use capa_core::policy::AuthPolicy;
use capa_core::rate_limit::{evaluate_ip_window, window_start, AttemptCheck};

use crate::error::AuthResult;
use crate::store::LoginAttemptStore;

/// Source IP recorded when the client address cannot be determined. All
/// such requests share one bucket.
pub const UNKNOWN_SOURCE_IP: &str = "unknown";

/// Counts attempts from one source IP inside the trailing window.
///
/// The limiter only reads; attempts are appended by
/// [`LockoutGuard::record_login_attempt`](crate::lockout::LockoutGuard::record_login_attempt).
#[derive(Clone)]
pub struct RateLimiter<S, C> {
    store: S,
    clock: C,
    policy: AuthPolicy,
}

impl<S: LoginAttemptStore, C: Clock> RateLimiter<S, C> {
    pub fn new(store: S, clock: C, policy: AuthPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    /// Whether another attempt from `source_ip` may proceed right now.
    ///
    /// A store failure is returned as [`AuthError::Unavailable`](crate::AuthError::Unavailable);
    /// it is never treated as "allowed".
    pub async fn check_ip_rate_limit(&self, source_ip: &str) -> AuthResult<AttemptCheck> {
        let now = self.clock.now();
        let since = window_start(now, &self.policy);
        let (count, oldest) = self.store.ip_window_stats(source_ip, since).await?;
        let check = evaluate_ip_window(count, oldest, now, &self.policy);

        if let AttemptCheck::Denied { retry_after_ms, .. } = &check {
            tracing::warn!(
                ip = %source_ip,
                attempts = count,
                retry_after_ms,
                "Source IP over login rate limit"
            );
        }
        Ok(check)
    }
}
