//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the database
//! row and, where rows are inserted, a plain create DTO.

pub mod audit;
pub mod login_attempt;
pub mod session;
pub mod user;
