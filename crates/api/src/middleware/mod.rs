//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- JWT claims only; no store round trip.
//! - [`auth::ValidSession`] -- claims plus a full session validation.
//! - [`rbac::RequireAdmin`] -- a validated session whose owner is an admin.

pub mod auth;
pub mod rbac;
