//! Session cap, revocation, validation and password rotation.

mod common;

use assert_matches::assert_matches;
use chrono::Duration;

use capa_auth::accounts::Actor;
use capa_auth::sessions::NewSession;
use capa_auth::AuthError;
use capa_core::audit::actions;
use capa_core::password_policy::PasswordPolicy;
use capa_core::policy::AuthPolicy;
use capa_core::sessions::revoke_reasons;

use common::{request, Harness, EMAIL, IP, PASSWORD};

const NEW_PASSWORD: &str = "New-Secret-Value-42!";

async fn login(h: &Harness) -> String {
    h.auth
        .verifier()
        .login(request(EMAIL, PASSWORD, IP))
        .await
        .expect("login should succeed")
        .session_token
}

fn admin() -> Actor {
    Actor {
        user_id: Some(999),
        email: Some("admin@example.com".to_string()),
        source_ip: Some("10.0.0.1".to_string()),
        user_agent: None,
    }
}

#[tokio::test]
async fn fourth_login_evicts_the_oldest_session() {
    let h = Harness::new();
    let user_id = h.store.add_user(EMAIL, PASSWORD, "investigator");

    let mut tokens = Vec::new();
    for _ in 0..4 {
        tokens.push(login(&h).await);
        h.clock.advance(Duration::minutes(1));
    }

    assert_eq!(h.store.live_session_count(user_id, h.now()), 3);
    let oldest = h.store.session(&tokens[0]);
    assert_eq!(oldest.revoked_reason.as_deref(), Some(revoke_reasons::SESSION_CAP));

    let validator = h.auth.validator();
    assert_matches!(
        validator.validate(&tokens[0]).await,
        Err(AuthError::SessionRevoked { reason }) if reason == revoke_reasons::SESSION_CAP
    );
    for token in &tokens[1..] {
        validator.validate(token).await.expect("newer sessions stay valid");
    }
}

#[tokio::test]
async fn cap_holds_over_many_logins() {
    let h = Harness::new();
    let user_id = h.store.add_user(EMAIL, PASSWORD, "investigator");

    for _ in 0..7 {
        login(&h).await;
        h.clock.advance(Duration::seconds(30));
        assert!(h.store.live_session_count(user_id, h.now()) <= 3);
    }
}

#[tokio::test]
async fn revocation_is_terminal_and_idempotent() {
    let h = Harness::new();
    h.store.add_user(EMAIL, PASSWORD, "viewer");
    let token = login(&h).await;
    let registry = h.auth.sessions();

    assert!(registry.revoke_session(&token, revoke_reasons::LOGOUT).await.unwrap());
    assert!(!registry
        .revoke_session(&token, revoke_reasons::ADMIN_REVOKE)
        .await
        .unwrap());

    assert_eq!(
        h.store.session(&token).revoked_reason.as_deref(),
        Some(revoke_reasons::LOGOUT)
    );
    assert_matches!(
        h.auth.validator().validate(&token).await,
        Err(AuthError::SessionRevoked { reason }) if reason == revoke_reasons::LOGOUT
    );
}

#[tokio::test]
async fn revoke_all_counts_only_unrevoked_sessions() {
    let h = Harness::new();
    let user_id = h.store.add_user(EMAIL, PASSWORD, "viewer");
    let first = login(&h).await;
    h.clock.advance(Duration::minutes(1));
    login(&h).await;

    let registry = h.auth.sessions();
    registry.revoke_session(&first, revoke_reasons::LOGOUT).await.unwrap();

    assert_eq!(
        registry
            .revoke_all_sessions(user_id, revoke_reasons::PASSWORD_CHANGE)
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        registry
            .revoke_all_sessions(user_id, revoke_reasons::PASSWORD_CHANGE)
            .await
            .unwrap(),
        0
    );
    assert!(registry.list_active_sessions(user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn valid_session_then_revoke_all_is_rejected() {
    let h = Harness::new();
    let user_id = h.store.add_user(EMAIL, PASSWORD, "reviewer");
    let token = login(&h).await;
    let validator = h.auth.validator();

    let validated = validator.validate(&token).await.expect("fresh session is valid");
    assert_eq!(validated.user.user.id, user_id);
    assert_eq!(validated.user.role, "reviewer");

    h.auth
        .sessions()
        .revoke_all_sessions(user_id, revoke_reasons::PASSWORD_CHANGE)
        .await
        .unwrap();

    assert_matches!(
        validator.validate(&token).await,
        Err(AuthError::SessionRevoked { reason }) if reason == revoke_reasons::PASSWORD_CHANGE
    );
}

#[tokio::test]
async fn password_change_after_issue_invalidates_and_revokes() {
    let h = Harness::new();
    let user_id = h.store.add_user(EMAIL, PASSWORD, "reviewer");
    let token = login(&h).await;

    h.clock.advance(Duration::seconds(1));
    h.store.set_password_changed_at(user_id, h.now());

    let validator = h.auth.validator();
    assert_matches!(
        validator.validate(&token).await,
        Err(AuthError::PasswordChangedSinceIssue)
    );
    assert_matches!(
        validator.validate(&token).await,
        Err(AuthError::SessionRevoked { reason }) if reason == revoke_reasons::PASSWORD_CHANGE
    );
}

#[tokio::test]
async fn expired_session_is_rejected() {
    let h = Harness::new();
    h.store.add_user(EMAIL, PASSWORD, "viewer");
    let token = login(&h).await;

    h.clock.advance(Duration::hours(24) + Duration::milliseconds(1));
    assert_matches!(
        h.auth.validator().validate(&token).await,
        Err(AuthError::SessionExpired)
    );
}

#[tokio::test]
async fn deactivated_owner_is_rejected() {
    let h = Harness::new();
    let user_id = h.store.add_user(EMAIL, PASSWORD, "viewer");
    let token = login(&h).await;

    h.store.set_active(user_id, false);
    assert_matches!(
        h.auth.validator().validate(&token).await,
        Err(AuthError::AccountDeactivated)
    );
}

#[tokio::test]
async fn unknown_token_is_not_found() {
    let h = Harness::new();
    assert_matches!(
        h.auth.validator().validate("no-such-token").await,
        Err(AuthError::SessionNotFound)
    );
}

#[tokio::test]
async fn activity_is_touched_at_most_once_per_interval() {
    let h = Harness::new();
    h.store.add_user(EMAIL, PASSWORD, "viewer");
    let token = login(&h).await;
    let issued = h.now();
    let validator = h.auth.validator();

    h.clock.advance(Duration::minutes(4));
    let validated = validator.validate(&token).await.unwrap();
    assert_eq!(validated.session.last_active_at, issued);
    assert_eq!(h.store.session(&token).last_active_at, issued);

    h.clock.advance(Duration::minutes(2));
    let validated = validator.validate(&token).await.unwrap();
    assert_eq!(validated.session.last_active_at, h.now());
    assert_eq!(h.store.session(&token).last_active_at, h.now());
}

#[tokio::test]
async fn sessions_are_listed_most_recent_first() {
    let h = Harness::new();
    let user_id = h.store.add_user(EMAIL, PASSWORD, "viewer");
    let registry = h.auth.sessions();

    let first = registry
        .create_session(NewSession {
            user_id,
            user_agent: Some("laptop".to_string()),
            source_ip: Some(IP.to_string()),
            ttl: Duration::hours(1),
        })
        .await
        .unwrap();
    h.clock.advance(Duration::minutes(1));
    let second = registry
        .create_session(NewSession {
            user_id,
            user_agent: Some("tablet".to_string()),
            source_ip: None,
            ttl: Duration::hours(1),
        })
        .await
        .unwrap();

    let listed = registry.list_active_sessions(user_id).await.unwrap();
    let ids: Vec<_> = listed.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert_ne!(first.session_token, second.session_token);
}

#[tokio::test]
async fn validation_surfaces_store_outage() {
    let h = Harness::new();
    h.store.add_user(EMAIL, PASSWORD, "viewer");
    let token = login(&h).await;

    h.store.set_unavailable(true);
    assert_matches!(
        h.auth.validator().validate(&token).await,
        Err(AuthError::Unavailable(_))
    );
}

#[tokio::test]
async fn admin_password_reset_revokes_every_session() {
    let h = Harness::new();
    let user_id = h.store.add_user(EMAIL, PASSWORD, "viewer");
    let first = login(&h).await;
    h.clock.advance(Duration::minutes(1));
    login(&h).await;
    h.clock.advance(Duration::minutes(1));

    let revoked = h
        .auth
        .accounts()
        .change_password(user_id, "New-Secret-Value-42!", &admin())
        .await
        .expect("password change should succeed");
    assert_eq!(revoked, 2);

    assert_matches!(
        h.auth.validator().validate(&first).await,
        Err(AuthError::SessionRevoked { reason }) if reason == revoke_reasons::PASSWORD_CHANGE
    );
    assert_eq!(h.store.user(user_id).password_changed_at, Some(h.now()));

    let entry = h
        .audit
        .entries()
        .into_iter()
        .find(|e| e.action == actions::USER_RESET_PASSWORD)
        .expect("reset should be audited");
    assert_eq!(entry.user_id, Some(999));
    assert_eq!(entry.entity_id, Some(user_id));
    assert_eq!(entry.metadata["revoked_sessions"], 2);

    // Old password no longer works; new one does.
    assert_matches!(
        h.auth.verifier().login(request(EMAIL, PASSWORD, IP)).await,
        Err(AuthError::InvalidCredentials)
    );
    h.auth
        .verifier()
        .login(request(EMAIL, "New-Secret-Value-42!", IP))
        .await
        .expect("new password should work");
}

#[tokio::test]
async fn weak_password_is_refused_without_side_effects() {
    let h = Harness::new();
    let user_id = h.store.add_user(EMAIL, PASSWORD, "viewer");
    let token = login(&h).await;

    let err = h
        .auth
        .accounts()
        .change_password(user_id, "short", &admin())
        .await
        .unwrap_err();
    assert_matches!(err, AuthError::WeakPassword(rules) => {
        assert!(!rules.is_empty());
    });
    h.auth.validator().validate(&token).await.expect("session untouched");
}

#[tokio::test]
async fn password_rules_follow_the_configured_policy() {
    let h = Harness::new();
    let user_id = h.store.add_user(EMAIL, PASSWORD, "viewer");
    let relaxed = h.auth.clone().with_password_policy(PasswordPolicy {
        min_length: 6,
        require_uppercase: false,
        require_lowercase: true,
        require_digit: false,
        require_special: false,
    });

    relaxed
        .accounts()
        .change_password(user_id, "plainword", &admin())
        .await
        .expect("relaxed policy should accept a plain word");
    assert_matches!(
        h.auth.accounts().change_password(user_id, "plainword", &admin()).await,
        Err(AuthError::WeakPassword(_))
    );
}

#[tokio::test]
async fn self_service_change_requires_current_password() {
    let h = Harness::new();
    let user_id = h.store.add_user(EMAIL, PASSWORD, "viewer");
    let actor = Actor {
        user_id: Some(user_id),
        ..Actor::default()
    };
    let accounts = h.auth.accounts();

    assert_matches!(
        accounts
            .change_own_password(user_id, "not-it", "New-Secret-Value-42!", &actor)
            .await,
        Err(AuthError::InvalidCredentials)
    );
    accounts
        .change_own_password(user_id, PASSWORD, "New-Secret-Value-42!", &actor)
        .await
        .expect("correct current password should succeed");
}

#[tokio::test]
async fn guessing_the_current_password_locks_the_account() {
    let h = Harness::new();
    let user_id = h.store.add_user(EMAIL, PASSWORD, "viewer");
    let actor = Actor {
        user_id: Some(user_id),
        source_ip: Some("198.51.100.23".to_string()),
        ..Actor::default()
    };
    let accounts = h.auth.accounts();

    for guess in 0..4 {
        assert_matches!(
            accounts
                .change_own_password(user_id, &format!("guess-{guess}"), NEW_PASSWORD, &actor)
                .await,
            Err(AuthError::InvalidCredentials)
        );
    }
    assert_matches!(
        accounts
            .change_own_password(user_id, "guess-4", "New-Secret-Value-42!", &actor)
            .await,
        Err(AuthError::AccountLocked { retry_after_ms }) if retry_after_ms == 15 * 60 * 1000
    );

    // The lock holds for the right password and for a fresh login.
    assert_matches!(
        accounts
            .change_own_password(user_id, PASSWORD, "New-Secret-Value-42!", &actor)
            .await,
        Err(AuthError::AccountLocked { .. })
    );
    assert_matches!(
        h.auth.verifier().login(request(EMAIL, PASSWORD, IP)).await,
        Err(AuthError::AccountLocked { .. })
    );

    let attempts = h.store.attempts();
    assert_eq!(attempts.len(), 5);
    assert!(attempts
        .iter()
        .all(|a| !a.success && a.ip_address == "198.51.100.23" && a.email == EMAIL));
    assert!(h
        .audit
        .actions()
        .iter()
        .all(|a| a == actions::USER_LOGIN_FAILED));
}

#[tokio::test]
async fn guessing_the_current_password_counts_toward_the_ip_limit() {
    let h = Harness::with_policy(AuthPolicy {
        lockout_threshold: 100,
        ..AuthPolicy::default()
    });
    let user_id = h.store.add_user(EMAIL, PASSWORD, "viewer");
    let actor = Actor {
        user_id: Some(user_id),
        source_ip: Some("198.51.100.24".to_string()),
        ..Actor::default()
    };
    let accounts = h.auth.accounts();

    for guess in 0..10 {
        let _ = accounts
            .change_own_password(user_id, &format!("guess-{guess}"), NEW_PASSWORD, &actor)
            .await;
    }
    assert_matches!(
        accounts
            .change_own_password(user_id, PASSWORD, "New-Secret-Value-42!", &actor)
            .await,
        Err(AuthError::RateLimited { .. })
    );
}

#[tokio::test]
async fn deactivation_revokes_sessions() {
    let h = Harness::new();
    let user_id = h.store.add_user(EMAIL, PASSWORD, "viewer");
    let token = login(&h).await;

    assert_eq!(
        h.auth.accounts().deactivate_user(user_id, &admin()).await.unwrap(),
        1
    );
    assert!(!h.store.user(user_id).is_active);
    assert_matches!(
        h.auth.validator().validate(&token).await,
        Err(AuthError::SessionRevoked { reason }) if reason == revoke_reasons::ACCOUNT_DEACTIVATED
    );
    assert_matches!(
        h.auth.accounts().deactivate_user(4242, &admin()).await,
        Err(AuthError::UnknownUser(4242))
    );
}
