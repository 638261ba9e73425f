//! Login attempt model, used only for rate-limit accounting.

use gatehouse_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A login attempt row from the `login_attempts` table.
#[derive(Debug, Clone, FromRow)]
pub struct LoginAttempt {
    pub id: DbId,
    /// What the caller tried to log in as (normalized email).
    pub identifier: String,
    /// Where the attempt came from (client IP, or "unknown").
    pub origin: String,
    pub succeeded: bool,
    pub attempted_at: Timestamp,
}
