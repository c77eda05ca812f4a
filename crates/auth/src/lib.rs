//! Authentication and session security.
//!
//! A login flows rate limiter → lockout guard → credential lookup →
//! password check → session registry; privileged actions go through the
//! session validator. All coordination state lives in the store, so the
//! services here hold no mutable state of their own.
//!
//! - [`rate_limit`] -- sliding-window limit per source IP.
//! - [`lockout`] -- per-account failure counter with timed lockout.
//! - [`sessions`] -- capped session registry with FIFO eviction.
//! - [`validator`] -- per-request session re-validation.
//! - [`verifier`] -- the login entry point.
//! - [`accounts`] -- password rotation and deactivation.
//! - [`password`] -- Argon2id hashing.
//! - [`jwt`] -- bearer tokens carrying the session token as `jti`.
//! - [`store`] / [`postgres`] -- store contracts and their PostgreSQL implementation.

pub mod accounts;
pub mod error;
pub mod jwt;
pub mod lockout;
pub mod password;
pub mod postgres;
pub mod rate_limit;
pub mod sessions;
pub mod store;
pub mod validator;
pub mod verifier;

use capa_core::audit::AuditSink;
use capa_core::clock::Clock;
use capa_core::password_policy::PasswordPolicy;
use capa_core::policy::AuthPolicy;

pub use error::{AuthError, AuthResult};
pub use store::AuthStore;

/// Entry point bundling a store, a clock and an audit sink with the limits
/// they are enforced under. Components are cheap to construct and are
/// handed out on demand.
#[derive(Clone)]
pub struct Authenticator<S, C, A> {
    store: S,
    clock: C,
    audit: A,
    policy: AuthPolicy,
    password_policy: PasswordPolicy,
}

impl<S, C, A> Authenticator<S, C, A>
where
    S: AuthStore,
    C: Clock + Clone,
    A: AuditSink + Clone,
{
    pub fn new(store: S, clock: C, audit: A, policy: AuthPolicy) -> Self {
        Self {
            store,
            clock,
            audit,
            policy,
            password_policy: PasswordPolicy::default(),
        }
    }

    pub fn with_password_policy(mut self, password_policy: PasswordPolicy) -> Self {
        self.password_policy = password_policy;
        self
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn rate_limiter(&self) -> rate_limit::RateLimiter<S, C> {
        rate_limit::RateLimiter::new(self.store.clone(), self.clock.clone(), self.policy)
    }

    pub fn lockout(&self) -> lockout::LockoutGuard<S, C> {
        lockout::LockoutGuard::new(self.store.clone(), self.clock.clone(), self.policy)
    }

    pub fn sessions(&self) -> sessions::SessionRegistry<S, C> {
        sessions::SessionRegistry::new(self.store.clone(), self.clock.clone(), self.policy)
    }

    pub fn validator(&self) -> validator::SessionValidator<S, C> {
        validator::SessionValidator::new(self.store.clone(), self.clock.clone(), self.policy)
    }

    pub fn verifier(&self) -> verifier::CredentialVerifier<S, C, A> {
        verifier::CredentialVerifier::new(
            self.store.clone(),
            self.clock.clone(),
            self.audit.clone(),
            self.policy,
        )
    }

    pub fn accounts(&self) -> accounts::AccountAdmin<S, C, A> {
        accounts::AccountAdmin::new(
            self.store.clone(),
            self.clock.clone(),
            self.audit.clone(),
            self.policy,
            self.password_policy,
        )
    }
}
