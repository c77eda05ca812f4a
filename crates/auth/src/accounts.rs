//! Password rotation and account deactivation.
//!
//! Both end every session the user holds: a password change revokes with
//! reason `password_change`, a deactivation with `account_deactivated`.
//! A wrong current password on the self-service path counts as a failed
//! login for both the IP rate limit and the account lockout.

use capa_core::audit::{actions, entity_types, AuditEntry, AuditSink};
use capa_core::clock::Clock;
use capa_core::password_policy::PasswordPolicy;
use capa_core::policy::AuthPolicy;
use capa_core::rate_limit::AttemptCheck;
use capa_core::sessions::revoke_reasons;
use capa_core::types::{DbId, Timestamp};

use crate::error::{AuthError, AuthResult};
use crate::lockout::{AttemptOutcome, LockoutGuard};
use crate::password::{hash_off_thread, verify_off_thread};
use crate::rate_limit::{RateLimiter, UNKNOWN_SOURCE_IP};
use crate::sessions::SessionRegistry;
use crate::store::AuthStore;

/// Who is performing an account change, for the audit trail.
#[derive(Debug, Clone, Default)]
pub struct Actor {
    pub user_id: Option<DbId>,
    pub email: Option<String>,
    pub source_ip: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Clone)]
pub struct AccountAdmin<S, C, A> {
    store: S,
    clock: C,
    audit: A,
    password_policy: PasswordPolicy,
    sessions: SessionRegistry<S, C>,
    rate_limiter: RateLimiter<S, C>,
    lockout: LockoutGuard<S, C>,
}

impl<S, C, A> AccountAdmin<S, C, A>
where
    S: AuthStore,
    C: Clock + Clone,
    A: AuditSink,
{
    pub fn new(
        store: S,
        clock: C,
        audit: A,
        policy: AuthPolicy,
        password_policy: PasswordPolicy,
    ) -> Self {
        Self {
            sessions: SessionRegistry::new(store.clone(), clock.clone(), policy),
            rate_limiter: RateLimiter::new(store.clone(), clock.clone(), policy),
            lockout: LockoutGuard::new(store.clone(), clock.clone(), policy),
            store,
            clock,
            audit,
            password_policy,
        }
    }

    /// Set a new password for `user_id` and revoke all of their sessions.
    ///
    /// Returns the number of sessions revoked. The caller is responsible
    /// for having authorised `actor` to change this user's password.
    pub async fn change_password(
        &self,
        user_id: DbId,
        new_password: &str,
        actor: &Actor,
    ) -> AuthResult<u64> {
        self.rotate(user_id, new_password, actor, false).await
    }

    /// Self-service variant of [`change_password`](Self::change_password):
    /// the user must prove the current password first.
    ///
    /// The proof goes through the same IP rate limit and account lockout
    /// as a login, and a wrong password is recorded as a failed attempt
    /// from `actor.source_ip`.
    pub async fn change_own_password(
        &self,
        user_id: DbId,
        current_password: &str,
        new_password: &str,
        actor: &Actor,
    ) -> AuthResult<u64> {
        let account = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UnknownUser(user_id))?;
        let email = account.user.email.as_str();
        let source_ip = actor.source_ip.as_deref().unwrap_or(UNKNOWN_SOURCE_IP);

        if let AttemptCheck::Denied { retry_after_ms, .. } =
            self.rate_limiter.check_ip_rate_limit(source_ip).await?
        {
            return Err(AuthError::RateLimited { retry_after_ms });
        }
        if let AttemptCheck::Denied { retry_after_ms, .. } =
            self.lockout.check_account_lockout(email).await?
        {
            return Err(AuthError::AccountLocked { retry_after_ms });
        }

        if !verify_off_thread(current_password, account.user.password_hash.clone()).await? {
            let outcome = self
                .lockout
                .record_login_attempt(email, source_ip, false)
                .await?;
            let now = self.clock.now();
            self.audit.record(
                actor_entry(actions::USER_LOGIN_FAILED, now, actor)
                    .with_entity(entity_types::USER, user_id)
                    .with_metadata(serde_json::json!({ "reason": "wrong_current_password" })),
            );
            tracing::warn!(user_id, "Wrong current password on password change");

            return Err(match outcome {
                AttemptOutcome::Locked { until } => AuthError::AccountLocked {
                    retry_after_ms: (until - now).num_milliseconds().max(0),
                },
                AttemptOutcome::Recorded | AttemptOutcome::UnknownAccount => {
                    AuthError::InvalidCredentials
                }
            });
        }
        self.rotate(user_id, new_password, actor, true).await
    }

    async fn rotate(
        &self,
        user_id: DbId,
        new_password: &str,
        actor: &Actor,
        self_service: bool,
    ) -> AuthResult<u64> {
        self.password_policy
            .validate(new_password)
            .map_err(AuthError::WeakPassword)?;

        let hash = hash_off_thread(new_password).await?;
        let now = self.clock.now();
        if !self.store.update_password(user_id, &hash, now).await? {
            return Err(AuthError::UnknownUser(user_id));
        }

        let revoked = self
            .sessions
            .revoke_all_sessions(user_id, revoke_reasons::PASSWORD_CHANGE)
            .await?;

        self.audit.record(
            actor_entry(actions::USER_RESET_PASSWORD, now, actor)
                .with_entity(entity_types::USER, user_id)
                .with_metadata(serde_json::json!({
                    "revoked_sessions": revoked,
                    "self_service": self_service,
                })),
        );
        tracing::info!(user_id, revoked, self_service, "Password changed");
        Ok(revoked)
    }

    /// Deactivate `user_id` and revoke all of their sessions.
    pub async fn deactivate_user(&self, user_id: DbId, actor: &Actor) -> AuthResult<u64> {
        if !self.store.deactivate_user(user_id).await? {
            return Err(AuthError::UnknownUser(user_id));
        }
        let revoked = self
            .sessions
            .revoke_all_sessions(user_id, revoke_reasons::ACCOUNT_DEACTIVATED)
            .await?;

        self.audit.record(
            actor_entry(actions::USER_DEACTIVATE, self.clock.now(), actor)
                .with_entity(entity_types::USER, user_id)
                .with_metadata(serde_json::json!({ "revoked_sessions": revoked })),
        );
        tracing::info!(user_id, revoked, "User deactivated");
        Ok(revoked)
    }
}

/// Audit entry pre-filled with the actor's identity and client details.
pub fn actor_entry(
    action: &str,
    occurred_at: Timestamp,
    actor: &Actor,
) -> AuditEntry {
    let mut entry = AuditEntry::new(action, occurred_at)
        .with_ip(actor.source_ip.as_deref())
        .with_user_agent(actor.user_agent.as_deref());
    if let Some(id) = actor.user_id {
        entry = entry.with_user(id);
    }
    if let Some(email) = &actor.email {
        entry = entry.with_email(email);
    }
    entry
}
