//! In-process audit bus backed by a `tokio::sync::broadcast` channel.

use tokio::sync::broadcast;
use capa_core::audit::{AuditEntry, AuditSink};

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out bus for [`AuditEntry`] values.
///
/// Shared via `Arc<AuditBus>`. When the buffer is full, the oldest
/// unconsumed entries are dropped and slow receivers observe
/// `RecvError::Lagged`.
pub struct AuditBus {
    sender: broadcast::Sender<AuditEntry>,
}

impl AuditBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to every entry published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<AuditEntry> {
        self.sender.subscribe()
    }

    /// Number of live receivers. Zero means entries are being dropped.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for AuditBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl AuditSink for AuditBus {
    fn record(&self, entry: AuditEntry) {
        if let Err(broadcast::error::SendError(entry)) = self.sender.send(entry) {
            tracing::debug!(action = %entry.action, "No audit subscribers, entry dropped");
        }
    }
}
