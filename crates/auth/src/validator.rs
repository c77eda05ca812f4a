//! Per-request session validation.

use capa_core::clock::Clock;
use capa_core::policy::AuthPolicy;
use capa_core::sessions::{evaluate_session, revoke_reasons, SessionCheck};
use capa_db::models::session::ActiveSession;
use capa_db::models::user::UserWithRole;

use crate::error::{AuthError, AuthResult};
use crate::store::{CredentialStore, SessionStore};

/// A session that passed every check, together with its owner.
#[derive(Debug, Clone)]
pub struct ValidatedSession {
    pub session: ActiveSession,
    pub user: UserWithRole,
}

/// Re-checks a session against the store before a privileged action.
///
/// Checks run in a fixed order and the first failure wins: revoked,
/// expired, owner deactivated, password changed since issue.
#[derive(Clone)]
pub struct SessionValidator<S, C> {
    store: S,
    clock: C,
    policy: AuthPolicy,
}

impl<S, C> SessionValidator<S, C>
where
    S: CredentialStore + SessionStore,
    C: Clock,
{
    pub fn new(store: S, clock: C, policy: AuthPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    /// Validate `token`, refreshing `last_active_at` when it is older than
    /// the touch interval.
    ///
    /// A session invalidated by a password change is revoked here with
    /// reason `password_change`, so later checks report it as revoked.
    pub async fn validate(&self, token: &str) -> AuthResult<ValidatedSession> {
        let now = self.clock.now();

        let mut session = self
            .store
            .find_session(token)
            .await?
            .ok_or(AuthError::SessionNotFound)?;
        let user = self.store.find_user_by_id(session.user_id).await?;

        let (user_active, password_changed_at) = user
            .as_ref()
            .map(|u| (u.user.is_active, u.user.password_changed_at))
            .unwrap_or((false, None));

        let facts = session.facts(user_active, password_changed_at);
        let touch = match evaluate_session(&facts, now, self.policy.session_touch_interval) {
            SessionCheck::Revoked { reason } => {
                return Err(AuthError::SessionRevoked {
                    reason: reason.to_string(),
                })
            }
            SessionCheck::Expired => return Err(AuthError::SessionExpired),
            SessionCheck::Deactivated => return Err(AuthError::AccountDeactivated),
            SessionCheck::PasswordChanged => {
                self.store
                    .revoke_session(token, revoke_reasons::PASSWORD_CHANGE, now)
                    .await?;
                tracing::info!(
                    user_id = session.user_id,
                    session_id = session.id,
                    "Session revoked after password change"
                );
                return Err(AuthError::PasswordChangedSinceIssue);
            }
            SessionCheck::Valid { touch } => touch,
        };

        let user = user.ok_or(AuthError::AccountDeactivated)?;

        if touch {
            match self.store.touch_session(token, now).await {
                Ok(_) => session.last_active_at = now,
                Err(e) => tracing::warn!(
                    session_id = session.id,
                    error = %e,
                    "Failed to refresh session activity"
                ),
            }
        }

        Ok(ValidatedSession { session, user })
    }
}
