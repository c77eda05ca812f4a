//! Store contracts the authentication services run against.
//!
//! Each method is a single statement against the backing store. Every
//! cross-request invariant (the attempt window, the failure counter, the
//! session cap) is enforced by the store's own atomicity, never by
//! in-process state. [`crate::postgres::PgAuthStore`] is the production
//! implementation.

use std::future::Future;

use capa_core::types::{DbId, Timestamp};
use capa_db::models::login_attempt::CreateLoginAttempt;
use capa_db::models::session::{ActiveSession, CreateSession};
use capa_db::models::user::UserWithRole;

/// User credentials and per-account lockout counters.
pub trait CredentialStore: Send + Sync {
    /// Case-insensitive lookup.
    fn find_user_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<UserWithRole>, sqlx::Error>> + Send;

    fn find_user_by_id(
        &self,
        id: DbId,
    ) -> impl Future<Output = Result<Option<UserWithRole>, sqlx::Error>> + Send;

    /// Atomically increment the failure counter, returning the new value.
    fn record_failed_login(
        &self,
        id: DbId,
        at: Timestamp,
    ) -> impl Future<Output = Result<Option<i32>, sqlx::Error>> + Send;

    fn lock_account(
        &self,
        id: DbId,
        until: Timestamp,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;

    /// Reset the failure counter and lock after a lapsed lockout.
    fn clear_lock(&self, id: DbId) -> impl Future<Output = Result<(), sqlx::Error>> + Send;

    /// Zero the failure counter, clear any lock and stamp `last_login_at`.
    fn record_successful_login(
        &self,
        id: DbId,
        at: Timestamp,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;

    /// Replace the password hash and stamp `password_changed_at`.
    fn update_password(
        &self,
        id: DbId,
        password_hash: &str,
        changed_at: Timestamp,
    ) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;

    fn deactivate_user(&self, id: DbId) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;
}

/// The append-only login attempt log.
pub trait LoginAttemptStore: Send + Sync {
    fn append_attempt(
        &self,
        attempt: CreateLoginAttempt,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;

    /// Count and oldest timestamp of attempts from `ip_address` with
    /// `created_at > since`.
    fn ip_window_stats(
        &self,
        ip_address: &str,
        since: Timestamp,
    ) -> impl Future<Output = Result<(i64, Option<Timestamp>), sqlx::Error>> + Send;
}

/// Session records. Revocation is terminal: revoke methods never touch a
/// session that already has `revoked_at` set.
pub trait SessionStore: Send + Sync {
    fn insert_session(
        &self,
        input: CreateSession,
    ) -> impl Future<Output = Result<ActiveSession, sqlx::Error>> + Send;

    fn find_session(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Option<ActiveSession>, sqlx::Error>> + Send;

    /// Live sessions ordered by `created_at` ascending.
    fn live_sessions_oldest_first(
        &self,
        user_id: DbId,
        now: Timestamp,
    ) -> impl Future<Output = Result<Vec<ActiveSession>, sqlx::Error>> + Send;

    /// Live sessions ordered by `last_active_at` descending.
    fn live_sessions_recent_first(
        &self,
        user_id: DbId,
        now: Timestamp,
    ) -> impl Future<Output = Result<Vec<ActiveSession>, sqlx::Error>> + Send;

    fn revoke_sessions(
        &self,
        ids: &[DbId],
        reason: &str,
        at: Timestamp,
    ) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;

    fn revoke_session(
        &self,
        token: &str,
        reason: &str,
        at: Timestamp,
    ) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;

    fn revoke_user_sessions(
        &self,
        user_id: DbId,
        reason: &str,
        at: Timestamp,
    ) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;

    fn touch_session(
        &self,
        token: &str,
        at: Timestamp,
    ) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;
}

/// Everything the authentication services need, as one bound.
pub trait AuthStore: CredentialStore + LoginAttemptStore + SessionStore + Clone + 'static {}

impl<T> AuthStore for T where T: CredentialStore + LoginAttemptStore + SessionStore + Clone + 'static {}
