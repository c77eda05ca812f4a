//! Sliding-window rate limiting over the durable login-attempt log.
//!
//! The window is recomputed from the attempt log on every check, so there is
//! no counter to reset and no sweep to run: once the oldest counted attempt
//! ages out of the window, the next check allows again.

use chrono::Duration;

use crate::policy::AuthPolicy;
use crate::types::Timestamp;

pub const RATE_LIMITED_REASON: &str = "Too many login attempts. Please try again later.";

/// Outcome of a pre-authentication gate (rate limit or lockout).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptCheck {
    Allowed,
    Denied {
        reason: &'static str,
        /// Milliseconds until the gate reopens. Never negative.
        retry_after_ms: i64,
    },
}

impl AttemptCheck {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AttemptCheck::Allowed)
    }
}

/// Attempts strictly newer than this instant fall inside the window.
pub fn window_start(now: Timestamp, policy: &AuthPolicy) -> Timestamp {
    now - policy.rate_limit_window
}

/// Decide whether another attempt from one source IP may proceed.
///
/// `attempts_in_window` and `oldest_in_window` describe the attempts with
/// `created_at > window_start(now)`.
pub fn evaluate_ip_window(
    attempts_in_window: i64,
    oldest_in_window: Option<Timestamp>,
    now: Timestamp,
    policy: &AuthPolicy,
) -> AttemptCheck {
    if attempts_in_window < policy.rate_limit_max_attempts {
        return AttemptCheck::Allowed;
    }

    let retry_after = match oldest_in_window {
        Some(oldest) => oldest + policy.rate_limit_window - now,
        None => policy.rate_limit_window,
    };

    AttemptCheck::Denied {
        reason: RATE_LIMITED_REASON,
        retry_after_ms: non_negative_ms(retry_after),
    }
}

pub(crate) fn non_negative_ms(d: Duration) -> i64 {
    d.num_milliseconds().max(0)
}
