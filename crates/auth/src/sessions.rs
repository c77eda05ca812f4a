//! Capped per-user session registry.

use chrono::Duration;
use uuid::Uuid;

use capa_core::clock::Clock;
use capa_core::policy::AuthPolicy;
use capa_core::sessions::{eviction_count, revoke_reasons};
use capa_core::types::DbId;
use capa_db::models::session::{ActiveSession, CreateSession};

use crate::error::AuthResult;
use crate::store::SessionStore;

/// Input for [`SessionRegistry::create_session`].
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: DbId,
    pub user_agent: Option<String>,
    pub source_ip: Option<String>,
    pub ttl: Duration,
}

/// Creates, lists and revokes sessions, keeping at most
/// `max_sessions_per_user` live per user by evicting the oldest.
#[derive(Clone)]
pub struct SessionRegistry<S, C> {
    store: S,
    clock: C,
    policy: AuthPolicy,
}

impl<S: SessionStore, C: Clock> SessionRegistry<S, C> {
    pub fn new(store: S, clock: C, policy: AuthPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    /// Insert a new session, first revoking the oldest live sessions with
    /// reason `session_cap` so that at most the cap remain afterwards.
    ///
    /// Two concurrent logins for one user may both see the same live set;
    /// the cap is then exceeded by at most the number of racing logins
    /// until the next login evicts again.
    pub async fn create_session(&self, input: NewSession) -> AuthResult<ActiveSession> {
        let now = self.clock.now();

        let live = self
            .store
            .live_sessions_oldest_first(input.user_id, now)
            .await?;
        let excess = eviction_count(live.len(), self.policy.max_sessions_per_user);
        if excess > 0 {
            let ids: Vec<DbId> = live.iter().take(excess).map(|s| s.id).collect();
            let evicted = self
                .store
                .revoke_sessions(&ids, revoke_reasons::SESSION_CAP, now)
                .await?;
            tracing::info!(
                user_id = input.user_id,
                evicted,
                cap = self.policy.max_sessions_per_user,
                "Evicted oldest sessions over the per-user cap"
            );
        }

        let session = self
            .store
            .insert_session(CreateSession {
                session_token: Uuid::new_v4().to_string(),
                user_id: input.user_id,
                user_agent: input.user_agent,
                ip_address: input.source_ip,
                created_at: now,
                expires_at: now + input.ttl,
            })
            .await?;

        tracing::debug!(
            user_id = session.user_id,
            session_id = session.id,
            expires_at = %session.expires_at,
            "Session created"
        );
        Ok(session)
    }

    /// Revoke one session. Returns `false` when the token is unknown or the
    /// session was already revoked; the original reason is kept.
    pub async fn revoke_session(&self, token: &str, reason: &str) -> AuthResult<bool> {
        let revoked = self
            .store
            .revoke_session(token, reason, self.clock.now())
            .await?;
        if revoked {
            tracing::info!(reason, "Session revoked");
        }
        Ok(revoked)
    }

    /// Revoke every unrevoked session of `user_id`, returning how many were
    /// revoked by this call.
    pub async fn revoke_all_sessions(&self, user_id: DbId, reason: &str) -> AuthResult<u64> {
        let revoked = self
            .store
            .revoke_user_sessions(user_id, reason, self.clock.now())
            .await?;
        tracing::info!(user_id, revoked, reason, "Revoked all sessions for user");
        Ok(revoked)
    }

    /// Live sessions of `user_id`, most recently active first.
    pub async fn list_active_sessions(&self, user_id: DbId) -> AuthResult<Vec<ActiveSession>> {
        Ok(self
            .store
            .live_sessions_recent_first(user_id, self.clock.now())
            .await?)
    }

    pub async fn find_session(&self, token: &str) -> AuthResult<Option<ActiveSession>> {
        Ok(self.store.find_session(token).await?)
    }
}
