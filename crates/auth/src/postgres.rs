//! PostgreSQL-backed [`AuthStore`](crate::store::AuthStore).

use capa_core::types::{DbId, Timestamp};
use capa_db::models::login_attempt::CreateLoginAttempt;
use capa_db::models::session::{ActiveSession, CreateSession};
use capa_db::models::user::UserWithRole;
use capa_db::repositories::{ActiveSessionRepo, LoginAttemptRepo, UserRepo};
use capa_db::DbPool;

use crate::store::{CredentialStore, LoginAttemptStore, SessionStore};

/// Thin adapter from the store traits to the `capa-db` repositories.
#[derive(Debug, Clone)]
pub struct PgAuthStore {
    pool: DbPool,
}

impl PgAuthStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CredentialStore for PgAuthStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserWithRole>, sqlx::Error> {
        UserRepo::find_with_role_by_email(&self.pool, email).await
    }

    async fn find_user_by_id(&self, id: DbId) -> Result<Option<UserWithRole>, sqlx::Error> {
        UserRepo::find_with_role_by_id(&self.pool, id).await
    }

    async fn record_failed_login(
        &self,
        id: DbId,
        at: Timestamp,
    ) -> Result<Option<i32>, sqlx::Error> {
        UserRepo::record_failed_login(&self.pool, id, at).await
    }

    async fn lock_account(&self, id: DbId, until: Timestamp) -> Result<(), sqlx::Error> {
        UserRepo::lock_account(&self.pool, id, until).await
    }

    async fn clear_lock(&self, id: DbId) -> Result<(), sqlx::Error> {
        UserRepo::clear_lock(&self.pool, id).await
    }

    async fn record_successful_login(&self, id: DbId, at: Timestamp) -> Result<(), sqlx::Error> {
        UserRepo::record_successful_login(&self.pool, id, at).await
    }

    async fn update_password(
        &self,
        id: DbId,
        password_hash: &str,
        changed_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        UserRepo::update_password(&self.pool, id, password_hash, changed_at).await
    }

    async fn deactivate_user(&self, id: DbId) -> Result<bool, sqlx::Error> {
        UserRepo::deactivate(&self.pool, id).await
    }
}

impl LoginAttemptStore for PgAuthStore {
    async fn append_attempt(&self, attempt: CreateLoginAttempt) -> Result<(), sqlx::Error> {
        LoginAttemptRepo::insert(&self.pool, &attempt).await?;
        Ok(())
    }

    async fn ip_window_stats(
        &self,
        ip_address: &str,
        since: Timestamp,
    ) -> Result<(i64, Option<Timestamp>), sqlx::Error> {
        LoginAttemptRepo::window_stats(&self.pool, ip_address, since).await
    }
}

impl SessionStore for PgAuthStore {
    async fn insert_session(&self, input: CreateSession) -> Result<ActiveSession, sqlx::Error> {
        ActiveSessionRepo::create(&self.pool, &input).await
    }

    async fn find_session(&self, token: &str) -> Result<Option<ActiveSession>, sqlx::Error> {
        ActiveSessionRepo::find_by_token(&self.pool, token).await
    }

    async fn live_sessions_oldest_first(
        &self,
        user_id: DbId,
        now: Timestamp,
    ) -> Result<Vec<ActiveSession>, sqlx::Error> {
        ActiveSessionRepo::list_live_oldest_first(&self.pool, user_id, now).await
    }

    async fn live_sessions_recent_first(
        &self,
        user_id: DbId,
        now: Timestamp,
    ) -> Result<Vec<ActiveSession>, sqlx::Error> {
        ActiveSessionRepo::list_live_recent_first(&self.pool, user_id, now).await
    }

    async fn revoke_sessions(
        &self,
        ids: &[DbId],
        reason: &str,
        at: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        ActiveSessionRepo::revoke_many(&self.pool, ids, reason, at).await
    }

    async fn revoke_session(
        &self,
        token: &str,
        reason: &str,
        at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        ActiveSessionRepo::revoke_by_token(&self.pool, token, reason, at).await
    }

    async fn revoke_user_sessions(
        &self,
        user_id: DbId,
        reason: &str,
        at: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        ActiveSessionRepo::revoke_all_for_user(&self.pool, user_id, reason, at).await
    }

    async fn touch_session(&self, token: &str, at: Timestamp) -> Result<bool, sqlx::Error> {
        ActiveSessionRepo::touch(&self.pool, token, at).await
    }
}
