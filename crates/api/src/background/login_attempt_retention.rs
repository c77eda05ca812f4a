//! Periodic purge of old rows from `login_attempts`.
//!
//! Only rows far older than the rate-limit window are removed, so the
//! limiter's answers never depend on whether this task has run.

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use capa_db::repositories::LoginAttemptRepo;
use capa_db::DbPool;

/// How often the cleanup job runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

/// Run the retention loop until `cancel` is triggered.
pub async fn run(pool: DbPool, retention_days: i64, cancel: CancellationToken) {
    tracing::info!(
        retention_days,
        interval_secs = CLEANUP_INTERVAL.as_secs(),
        "Login attempt retention job started"
    );

    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Login attempt retention job stopping");
                break;
            }
            _ = interval.tick() => {
                let cutoff = Utc::now() - chrono::Duration::days(retention_days);
                match LoginAttemptRepo::delete_older_than(&pool, cutoff).await {
                    Ok(deleted) if deleted > 0 => {
                        tracing::info!(deleted, "Login attempt retention: purged old rows");
                    }
                    Ok(_) => tracing::debug!("Login attempt retention: no rows to purge"),
                    Err(e) => {
                        tracing::error!(error = %e, "Login attempt retention: cleanup failed");
                    }
                }
            }
        }
    }
}
