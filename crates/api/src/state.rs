use std::sync::Arc;

use capa_auth::postgres::PgAuthStore;
use capa_auth::Authenticator;
use capa_core::clock::SystemClock;
use capa_events::AuditBus;

use crate::config::ServerConfig;

/// The authentication services as wired in production.
pub type AppAuth = Authenticator<PgAuthStore, SystemClock, Arc<AuditBus>>;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind an `Arc` or is a pool handle.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: capa_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Rate limiter, lockout guard, session registry and friends.
    pub auth: Arc<AppAuth>,
    /// Audit events published here are persisted by a background task.
    pub audit: Arc<AuditBus>,
}

impl AppState {
    pub fn new(pool: capa_db::DbPool, config: ServerConfig, audit: Arc<AuditBus>) -> Self {
        let auth = Authenticator::new(
            PgAuthStore::new(pool.clone()),
            SystemClock,
            Arc::clone(&audit),
            config.auth_policy,
        );
        Self {
            pool,
            config: Arc::new(config),
            auth: Arc::new(auth),
            audit,
        }
    }
}
