//! Workspace-wide error taxonomy.
//!
//! Clients never learn which specific credential check failed; the variants
//! here carry a client-safe message while the specific cause is logged at the
//! call site.

/// Domain-level error shared across the Gatehouse crates.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An entity lookup by id came up empty.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// A request failed input validation.
    #[error("{0}")]
    Validation(String),

    /// A uniqueness or state conflict (e.g. email already registered).
    #[error("{0}")]
    Conflict(String),

    /// Authentication failed. The message is deliberately uniform between
    /// "no such user" and "wrong password" to prevent account enumeration.
    #[error("{0}")]
    Unauthorized(String),

    /// The caller is authenticated but not allowed to act on the resource.
    #[error("{0}")]
    Forbidden(String),

    /// Too many failed login attempts for this identifier/origin pair.
    #[error("{0}")]
    RateLimited(String),

    /// An internal failure whose detail must not reach the client.
    #[error("{0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for the uniform invalid-credentials rejection.
    pub fn invalid_credentials() -> Self {
        CoreError::Unauthorized("Invalid email or password".into())
    }
}
