//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- access-token generation and validation.
//! - [`rate_limit`] -- login-attempt rate limiting.

pub mod jwt;
pub mod password;
pub mod rate_limit;
