//! Domain types and pure decision logic for the CAPA authentication core.
//!
//! Nothing in this crate performs IO. Repositories live in `capa-db`, the
//! store-backed services in `capa-auth`.

pub mod audit;
pub mod clock;
pub mod error;
pub mod lockout;
pub mod password_policy;
pub mod policy;
pub mod rate_limit;
pub mod roles;
pub mod sessions;
pub mod types;
