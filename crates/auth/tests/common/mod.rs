//! Shared fixtures for capa-auth scenario tests.
//!
//! [`MemoryStore`] implements the store traits over plain vectors so the
//! services can be driven against a [`ManualClock`] without a database.
//! It can simulate a full outage or a fault in one kind of attempt write.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};

use capa_auth::password::hash_password;
use capa_auth::store::{CredentialStore, LoginAttemptStore, SessionStore};
use capa_auth::verifier::LoginRequest;
use capa_auth::Authenticator;
use capa_core::audit::{AuditEntry, AuditSink};
use capa_core::clock::ManualClock;
use capa_core::policy::AuthPolicy;
use capa_core::types::{DbId, Timestamp};
use capa_db::models::login_attempt::CreateLoginAttempt;
use capa_db::models::session::{ActiveSession, CreateSession};
use capa_db::models::user::{User, UserWithRole};

pub const PASSWORD: &str = "Correct-Horse-9!";
pub const EMAIL: &str = "qa.lead@example.com";
pub const IP: &str = "203.0.113.7";

pub fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Tables {
    users: Vec<UserWithRole>,
    attempts: Vec<CreateLoginAttempt>,
    sessions: Vec<ActiveSession>,
    next_id: DbId,
}

impl Tables {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    fn user_mut(&mut self, id: DbId) -> Option<&mut User> {
        self.users
            .iter_mut()
            .map(|u| &mut u.user)
            .find(|u| u.id == id)
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    unavailable: Arc<AtomicBool>,
    failing_attempt_writes: Arc<Mutex<Option<bool>>>,
}

impl MemoryStore {
    /// Make every subsequent store call fail as if the pool were exhausted.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make `append_attempt` fail for attempts with this `success` value
    /// only. Every other call keeps working. `None` clears the fault.
    pub fn fail_attempt_writes(&self, success: Option<bool>) {
        *self.failing_attempt_writes.lock().unwrap() = success;
    }

    fn check(&self) -> Result<(), sqlx::Error> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(sqlx::Error::PoolTimedOut)
        } else {
            Ok(())
        }
    }

    pub fn add_user(&self, email: &str, password: &str, role: &str) -> DbId {
        let hash = hash_password(password).expect("hashing should succeed");
        let mut tables = self.tables.lock().unwrap();
        let id = tables.next_id();
        tables.users.push(UserWithRole {
            user: User {
                id,
                name: format!("User {id}"),
                email: email.to_lowercase(),
                password_hash: hash,
                role_id: 1,
                is_active: true,
                failed_login_count: 0,
                locked_until: None,
                last_failed_login_at: None,
                last_login_at: None,
                password_changed_at: None,
                created_at: t0(),
                updated_at: t0(),
            },
            role: role.to_string(),
        });
        id
    }

    pub fn user(&self, id: DbId) -> User {
        let tables = self.tables.lock().unwrap();
        tables
            .users
            .iter()
            .find(|u| u.user.id == id)
            .map(|u| u.user.clone())
            .expect("user should exist")
    }

    pub fn set_active(&self, id: DbId, active: bool) {
        let mut tables = self.tables.lock().unwrap();
        tables.user_mut(id).expect("user should exist").is_active = active;
    }

    pub fn set_password_changed_at(&self, id: DbId, at: Timestamp) {
        let mut tables = self.tables.lock().unwrap();
        tables.user_mut(id).expect("user should exist").password_changed_at = Some(at);
    }

    pub fn attempts(&self) -> Vec<CreateLoginAttempt> {
        self.tables.lock().unwrap().attempts.clone()
    }

    pub fn session(&self, token: &str) -> ActiveSession {
        let tables = self.tables.lock().unwrap();
        tables
            .sessions
            .iter()
            .find(|s| s.session_token == token)
            .cloned()
            .expect("session should exist")
    }

    pub fn live_session_count(&self, user_id: DbId, now: Timestamp) -> usize {
        let tables = self.tables.lock().unwrap();
        tables
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id && s.is_live(now))
            .count()
    }
}

impl CredentialStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserWithRole>, sqlx::Error> {
        self.check()?;
        let email = email.to_lowercase();
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.user.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: DbId) -> Result<Option<UserWithRole>, sqlx::Error> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.user.id == id).cloned())
    }

    async fn record_failed_login(
        &self,
        id: DbId,
        at: Timestamp,
    ) -> Result<Option<i32>, sqlx::Error> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        Ok(tables.user_mut(id).map(|u| {
            u.failed_login_count += 1;
            u.last_failed_login_at = Some(at);
            u.failed_login_count
        }))
    }

    async fn lock_account(&self, id: DbId, until: Timestamp) -> Result<(), sqlx::Error> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        if let Some(u) = tables.user_mut(id) {
            u.locked_until = Some(until);
        }
        Ok(())
    }

    async fn clear_lock(&self, id: DbId) -> Result<(), sqlx::Error> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        if let Some(u) = tables.user_mut(id) {
            u.failed_login_count = 0;
            u.locked_until = None;
        }
        Ok(())
    }

    async fn record_successful_login(&self, id: DbId, at: Timestamp) -> Result<(), sqlx::Error> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        if let Some(u) = tables.user_mut(id) {
            u.failed_login_count = 0;
            u.locked_until = None;
            u.last_login_at = Some(at);
        }
        Ok(())
    }

    async fn update_password(
        &self,
        id: DbId,
        password_hash: &str,
        changed_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        Ok(match tables.user_mut(id) {
            Some(u) => {
                u.password_hash = password_hash.to_string();
                u.password_changed_at = Some(changed_at);
                u.failed_login_count = 0;
                u.locked_until = None;
                true
            }
            None => false,
        })
    }

    async fn deactivate_user(&self, id: DbId) -> Result<bool, sqlx::Error> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        Ok(match tables.user_mut(id) {
            Some(u) => {
                u.is_active = false;
                true
            }
            None => false,
        })
    }
}

impl LoginAttemptStore for MemoryStore {
    async fn append_attempt(&self, attempt: CreateLoginAttempt) -> Result<(), sqlx::Error> {
        self.check()?;
        if *self.failing_attempt_writes.lock().unwrap() == Some(attempt.success) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        self.tables.lock().unwrap().attempts.push(attempt);
        Ok(())
    }

    async fn ip_window_stats(
        &self,
        ip_address: &str,
        since: Timestamp,
    ) -> Result<(i64, Option<Timestamp>), sqlx::Error> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        let in_window: Vec<Timestamp> = tables
            .attempts
            .iter()
            .filter(|a| a.ip_address == ip_address && a.created_at > since)
            .map(|a| a.created_at)
            .collect();
        Ok((in_window.len() as i64, in_window.iter().min().copied()))
    }
}

impl SessionStore for MemoryStore {
    async fn insert_session(&self, input: CreateSession) -> Result<ActiveSession, sqlx::Error> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        let session = ActiveSession {
            id: tables.next_id(),
            session_token: input.session_token,
            user_id: input.user_id,
            user_agent: input.user_agent,
            ip_address: input.ip_address,
            created_at: input.created_at,
            last_active_at: input.created_at,
            expires_at: input.expires_at,
            revoked_at: None,
            revoked_reason: None,
        };
        tables.sessions.push(session.clone());
        Ok(session)
    }

    async fn find_session(&self, token: &str) -> Result<Option<ActiveSession>, sqlx::Error> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .sessions
            .iter()
            .find(|s| s.session_token == token)
            .cloned())
    }

    async fn live_sessions_oldest_first(
        &self,
        user_id: DbId,
        now: Timestamp,
    ) -> Result<Vec<ActiveSession>, sqlx::Error> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        let mut live: Vec<ActiveSession> = tables
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id && s.is_live(now))
            .cloned()
            .collect();
        live.sort_by_key(|s| (s.created_at, s.id));
        Ok(live)
    }

    async fn live_sessions_recent_first(
        &self,
        user_id: DbId,
        now: Timestamp,
    ) -> Result<Vec<ActiveSession>, sqlx::Error> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        let mut live: Vec<ActiveSession> = tables
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id && s.is_live(now))
            .cloned()
            .collect();
        live.sort_by_key(|s| std::cmp::Reverse((s.last_active_at, s.id)));
        Ok(live)
    }

    async fn revoke_sessions(
        &self,
        ids: &[DbId],
        reason: &str,
        at: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        let mut revoked = 0;
        for s in tables
            .sessions
            .iter_mut()
            .filter(|s| ids.contains(&s.id) && s.revoked_at.is_none())
        {
            s.revoked_at = Some(at);
            s.revoked_reason = Some(reason.to_string());
            revoked += 1;
        }
        Ok(revoked)
    }

    async fn revoke_session(
        &self,
        token: &str,
        reason: &str,
        at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        match tables
            .sessions
            .iter_mut()
            .find(|s| s.session_token == token && s.revoked_at.is_none())
        {
            Some(s) => {
                s.revoked_at = Some(at);
                s.revoked_reason = Some(reason.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn revoke_user_sessions(
        &self,
        user_id: DbId,
        reason: &str,
        at: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        let mut revoked = 0;
        for s in tables
            .sessions
            .iter_mut()
            .filter(|s| s.user_id == user_id && s.revoked_at.is_none())
        {
            s.revoked_at = Some(at);
            s.revoked_reason = Some(reason.to_string());
            revoked += 1;
        }
        Ok(revoked)
    }

    async fn touch_session(&self, token: &str, at: Timestamp) -> Result<bool, sqlx::Error> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        match tables
            .sessions
            .iter_mut()
            .find(|s| s.session_token == token && s.revoked_at.is_none())
        {
            Some(s) => {
                s.last_active_at = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// ---------------------------------------------------------------------------
// Audit capture
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl RecordingAuditSink {
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn actions(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.action).collect()
    }
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, entry: AuditEntry) {
        self.entries.lock().unwrap().push(entry);
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub type TestAuth = Authenticator<MemoryStore, Arc<ManualClock>, Arc<RecordingAuditSink>>;

pub struct Harness {
    pub store: MemoryStore,
    pub clock: Arc<ManualClock>,
    pub audit: Arc<RecordingAuditSink>,
    pub auth: TestAuth,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_policy(AuthPolicy::default())
    }

    pub fn with_policy(policy: AuthPolicy) -> Self {
        let store = MemoryStore::default();
        let clock = Arc::new(ManualClock::new(t0()));
        let audit = Arc::new(RecordingAuditSink::default());
        let auth = Authenticator::new(store.clone(), Arc::clone(&clock), Arc::clone(&audit), policy);
        Self {
            store,
            clock,
            audit,
            auth,
        }
    }

    pub fn now(&self) -> Timestamp {
        use capa_core::clock::Clock;
        self.clock.now()
    }
}

pub fn request<'a>(email: &'a str, password: &'a str, ip: &'a str) -> LoginRequest<'a> {
    LoginRequest {
        email,
        password,
        source_ip: ip,
        user_agent: Some("Mozilla/5.0 (X11; Linux x86_64)"),
    }
}
