//! Domain primitives shared by every Gatehouse crate.
//!
//! - [`error`] -- the `CoreError` taxonomy used across the workspace.
//! - [`hashing`] -- SHA-256 hex digests.
//! - [`token`] -- secure random tokens, constant-time comparison,
//!   CSRF tokens, and device fingerprints.
//! - [`types`] -- shared id and timestamp aliases.

pub mod error;
pub mod hashing;
pub mod token;
pub mod types;

pub use error::CoreError;
