//! Fire-and-forget audit delivery.
//!
//! - [`AuditBus`]: an [`AuditSink`](capa_core::audit::AuditSink) backed by
//!   `tokio::sync::broadcast`; recording never waits on the database.
//! - [`AuditPersistence`]: background service that writes every entry
//!   published on the bus to the `audit_logs` table.

pub mod bus;
pub mod persistence;

pub use bus::AuditBus;
pub use persistence::AuditPersistence;
