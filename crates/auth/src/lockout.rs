//! Per-account failure counting and timed lockout.

use capa_core::clock::Clock;
use capa_core::lockout::{check_lock, lock_after_failure, LockCheck};
use capa_core::policy::AuthPolicy;
use capa_core::rate_limit::AttemptCheck;
use capa_core::types::Timestamp;
use capa_db::models::login_attempt::CreateLoginAttempt;

use crate::error::AuthResult;
use crate::store::{CredentialStore, LoginAttemptStore};

/// What recording an attempt did to the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// No account matches the email; only the log entry was written.
    UnknownAccount,
    /// Counters were updated and the account is not locked.
    Recorded,
    /// This failure crossed the threshold and locked the account.
    Locked { until: Timestamp },
}

#[derive(Clone)]
pub struct LockoutGuard<S, C> {
    store: S,
    clock: C,
    policy: AuthPolicy,
}

impl<S, C> LockoutGuard<S, C>
where
    S: CredentialStore + LoginAttemptStore,
    C: Clock,
{
    pub fn new(store: S, clock: C, policy: AuthPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    /// Whether the account for `email` may attempt a login right now.
    ///
    /// Unknown emails are allowed, so the response does not reveal whether
    /// an account exists. A lock whose deadline has passed is cleared here
    /// and the attempt is allowed.
    pub async fn check_account_lockout(&self, email: &str) -> AuthResult<AttemptCheck> {
        let Some(account) = self.store.find_user_by_email(email).await? else {
            return Ok(AttemptCheck::Allowed);
        };
        let user = &account.user;

        let check = check_lock(user.locked_until, self.clock.now());
        if check == LockCheck::Lapsed {
            self.store.clear_lock(user.id).await?;
            tracing::info!(user_id = user.id, "Account lock lapsed, counters cleared");
        }
        Ok(check.to_attempt_check())
    }

    /// Append an attempt to the log and update the account's counters.
    ///
    /// A success zeroes the counter and clears any lock. A failure
    /// increments the counter atomically and, when it reaches the
    /// threshold, locks the account for the lockout duration.
    pub async fn record_login_attempt(
        &self,
        email: &str,
        source_ip: &str,
        success: bool,
    ) -> AuthResult<AttemptOutcome> {
        let now = self.clock.now();
        let email = email.trim().to_lowercase();

        self.store
            .append_attempt(CreateLoginAttempt {
                email: email.clone(),
                ip_address: source_ip.to_string(),
                success,
                created_at: now,
            })
            .await?;

        let Some(account) = self.store.find_user_by_email(&email).await? else {
            return Ok(AttemptOutcome::UnknownAccount);
        };
        let user_id = account.user.id;

        if success {
            self.store.record_successful_login(user_id, now).await?;
            return Ok(AttemptOutcome::Recorded);
        }

        let Some(failures) = self.store.record_failed_login(user_id, now).await? else {
            return Ok(AttemptOutcome::UnknownAccount);
        };

        match lock_after_failure(failures, now, &self.policy) {
            Some(until) => {
                self.store.lock_account(user_id, until).await?;
                tracing::warn!(
                    user_id,
                    failures,
                    locked_until = %until,
                    "Account locked after repeated login failures"
                );
                Ok(AttemptOutcome::Locked { until })
            }
            None => {
                tracing::debug!(user_id, failures, "Failed login recorded");
                Ok(AttemptOutcome::Recorded)
            }
        }
    }
}
