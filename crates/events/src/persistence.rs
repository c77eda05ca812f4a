//! Durable audit persistence service.

use tokio::sync::broadcast;
use capa_core::audit::AuditEntry;
use capa_db::models::audit::CreateAuditLog;
use capa_db::repositories::AuditLogRepo;
use capa_db::DbPool;

/// Background service that writes audit entries to `audit_logs`.
pub struct AuditPersistence;

impl AuditPersistence {
    /// Run the persistence loop until the bus is dropped.
    ///
    /// A failed write is logged and the entry is dropped; it is never retried
    /// and never reported to whoever recorded it.
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<AuditEntry>) {
        loop {
            match receiver.recv().await {
                Ok(entry) => {
                    let action = entry.action.clone();
                    if let Err(e) = AuditLogRepo::insert(&pool, &CreateAuditLog::from(entry)).await {
                        tracing::error!(error = %e, %action, "Audit log write failed");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Audit persistence lagged, entries were dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Audit bus closed, persistence shutting down");
                    break;
                }
            }
        }
    }
}
