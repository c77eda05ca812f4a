//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Methods that compare against the
//! current time take `now` explicitly instead of using `NOW()`.

pub mod audit_repo;
pub mod login_attempt_repo;
pub mod session_repo;
pub mod user_repo;

pub use audit_repo::AuditLogRepo;
pub use login_attempt_repo::LoginAttemptRepo;
pub use session_repo::ActiveSessionRepo;
pub use user_repo::UserRepo;
