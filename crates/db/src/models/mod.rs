//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - A create DTO for inserts

pub mod login_attempt;
pub mod refresh_token;
pub mod session;
pub mod user;
