//! Email/password login.

use serde::Serialize;

use capa_core::audit::{actions, entity_types, AuditEntry, AuditSink};
use capa_core::clock::Clock;
use capa_core::policy::AuthPolicy;
use capa_core::rate_limit::AttemptCheck;
use capa_core::types::{DbId, Timestamp};
use capa_db::models::user::UserWithRole;

use crate::error::{AuthError, AuthResult};
use crate::lockout::{AttemptOutcome, LockoutGuard};
use crate::password::{dummy_hash, verify_off_thread};
use crate::rate_limit::RateLimiter;
use crate::sessions::{NewSession, SessionRegistry};
use crate::store::AuthStore;

/// One login attempt as received from a client.
#[derive(Debug, Clone, Copy)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub source_ip: &'a str,
    pub user_agent: Option<&'a str>,
}

/// The principal established by a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    pub user_id: DbId,
    pub email: String,
    pub name: String,
    pub role: String,
    pub session_token: String,
    pub expires_at: Timestamp,
}

/// Runs the full login sequence: IP rate limit, account lockout,
/// credential check, attempt recording, then session creation.
#[derive(Clone)]
pub struct CredentialVerifier<S, C, A> {
    store: S,
    clock: C,
    audit: A,
    policy: AuthPolicy,
    rate_limiter: RateLimiter<S, C>,
    lockout: LockoutGuard<S, C>,
    sessions: SessionRegistry<S, C>,
}

impl<S, C, A> CredentialVerifier<S, C, A>
where
    S: AuthStore,
    C: Clock + Clone,
    A: AuditSink,
{
    pub fn new(store: S, clock: C, audit: A, policy: AuthPolicy) -> Self {
        Self {
            rate_limiter: RateLimiter::new(store.clone(), clock.clone(), policy),
            lockout: LockoutGuard::new(store.clone(), clock.clone(), policy),
            sessions: SessionRegistry::new(store.clone(), clock.clone(), policy),
            store,
            clock,
            audit,
            policy,
        }
    }

    /// Authenticate `request` and open a session.
    ///
    /// Unknown, inactive and wrong-password outcomes are indistinguishable
    /// to the caller ([`AuthError::InvalidCredentials`]) and cost one
    /// password verification each. The failure that locks an account is
    /// reported as [`AuthError::AccountLocked`].
    pub async fn login(&self, request: LoginRequest<'_>) -> AuthResult<Identity> {
        let email = request.email.trim().to_lowercase();

        if let AttemptCheck::Denied { retry_after_ms, .. } = self
            .rate_limiter
            .check_ip_rate_limit(request.source_ip)
            .await?
        {
            return Err(AuthError::RateLimited { retry_after_ms });
        }

        if let AttemptCheck::Denied { retry_after_ms, .. } =
            self.lockout.check_account_lockout(&email).await?
        {
            tracing::info!(email = %email, retry_after_ms, "Login refused for locked account");
            return Err(AuthError::AccountLocked { retry_after_ms });
        }

        let account = self.store.find_user_by_email(&email).await?;
        let candidate = account.as_ref().filter(|a| a.user.is_active);

        let matches = match candidate {
            Some(a) => verify_off_thread(request.password, a.user.password_hash.clone()).await?,
            None => match dummy_hash() {
                Some(hash) => {
                    verify_off_thread(request.password, hash.to_owned()).await?;
                    false
                }
                None => false,
            },
        };

        match candidate {
            Some(account) if matches => self.accept(&email, account, request).await,
            _ => Err(self.reject(&email, account.as_ref(), request).await?),
        }
    }

    async fn accept(
        &self,
        email: &str,
        account: &UserWithRole,
        request: LoginRequest<'_>,
    ) -> AuthResult<Identity> {
        let user = &account.user;

        if let Err(e) = self
            .lockout
            .record_login_attempt(email, request.source_ip, true)
            .await
        {
            tracing::warn!(user_id = user.id, error = %e, "Failed to record successful login");
        }

        let session = self
            .sessions
            .create_session(NewSession {
                user_id: user.id,
                user_agent: request.user_agent.map(str::to_owned),
                source_ip: Some(request.source_ip.to_owned()),
                ttl: self.policy.session_ttl,
            })
            .await?;

        self.audit.record(
            AuditEntry::new(actions::USER_LOGIN, self.clock.now())
                .with_user(user.id)
                .with_email(&user.email)
                .with_entity(entity_types::SESSION, session.id)
                .with_ip(Some(request.source_ip))
                .with_user_agent(request.user_agent),
        );
        tracing::info!(user_id = user.id, session_id = session.id, "Login succeeded");

        Ok(Identity {
            user_id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: account.role.clone(),
            session_token: session.session_token,
            expires_at: session.expires_at,
        })
    }

    /// Record a failed attempt and work out what to tell the caller.
    async fn reject(
        &self,
        email: &str,
        account: Option<&UserWithRole>,
        request: LoginRequest<'_>,
    ) -> AuthResult<AuthError> {
        let outcome = self
            .lockout
            .record_login_attempt(email, request.source_ip, false)
            .await?;
        let now = self.clock.now();

        let mut entry = AuditEntry::new(actions::USER_LOGIN_FAILED, now)
            .with_email(email)
            .with_ip(Some(request.source_ip))
            .with_user_agent(request.user_agent);
        if let Some(a) = account {
            entry = entry.with_user(a.user.id);
        }
        let reason = match outcome {
            AttemptOutcome::UnknownAccount => "unknown_account",
            AttemptOutcome::Locked { .. } => "account_locked",
            AttemptOutcome::Recorded => "invalid_credentials",
        };
        self.audit
            .record(entry.with_metadata(serde_json::json!({ "reason": reason })));

        Ok(match outcome {
            AttemptOutcome::Locked { until } => AuthError::AccountLocked {
                retry_after_ms: (until - now).num_milliseconds().max(0),
            },
            AttemptOutcome::Recorded | AttemptOutcome::UnknownAccount => {
                AuthError::InvalidCredentials
            }
        })
    }
}
