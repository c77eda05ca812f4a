//! Per-account lockout rules.
//!
//! A lock is just a `locked_until` timestamp on the user row. A lock whose
//! deadline has passed behaves as unlocked on the very next check; the
//! caller clears the stale fields when it sees [`LockCheck::Lapsed`].

use crate::policy::AuthPolicy;
use crate::rate_limit::{non_negative_ms, AttemptCheck};
use crate::types::Timestamp;

pub const ACCOUNT_LOCKED_REASON: &str =
    "Account temporarily locked due to too many failed attempts. Try again later.";

/// State of an account's lock at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockCheck {
    /// No lock recorded.
    Open,
    /// A lock was recorded but has expired; counters should be cleared.
    Lapsed,
    /// Locked; `retry_after_ms` until it lapses.
    Locked { retry_after_ms: i64 },
}

impl LockCheck {
    pub fn to_attempt_check(self) -> AttemptCheck {
        match self {
            LockCheck::Open | LockCheck::Lapsed => AttemptCheck::Allowed,
            LockCheck::Locked { retry_after_ms } => AttemptCheck::Denied {
                reason: ACCOUNT_LOCKED_REASON,
                retry_after_ms,
            },
        }
    }
}

/// Classify `locked_until` relative to `now`.
pub fn check_lock(locked_until: Option<Timestamp>, now: Timestamp) -> LockCheck {
    match locked_until {
        None => LockCheck::Open,
        Some(until) if until > now => LockCheck::Locked {
            retry_after_ms: non_negative_ms(until - now),
        },
        Some(_) => LockCheck::Lapsed,
    }
}

/// Lock deadline to store after a failure brought the counter to `new_count`,
/// or `None` when the threshold has not been reached.
pub fn lock_after_failure(
    new_count: i32,
    now: Timestamp,
    policy: &AuthPolicy,
) -> Option<Timestamp> {
    (new_count >= policy.lockout_threshold).then(|| now + policy.lockout_duration)
}
