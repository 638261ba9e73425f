//! Refresh token ledger model and DTOs.

use gatehouse_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A refresh token row from the `refresh_tokens` table.
///
/// Holds only the SHA-256 hash of the issued token; the plaintext exists
/// solely in the client's cookie.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshToken {
    pub id: DbId,
    pub user_id: DbId,
    pub token_hash: String,
    pub expires_at: Timestamp,
    pub revoked: bool,
    pub device_info: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: Timestamp,
}

impl RefreshToken {
    /// Whether the validity window has passed. Revocation is tracked
    /// separately so callers can report expiry distinctly.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at <= now
    }
}

/// DTO for issuing a new refresh token.
pub struct CreateRefreshToken {
    pub user_id: DbId,
    pub token_hash: String,
    pub expires_at: Timestamp,
    pub device_info: Option<String>,
    pub ip_address: Option<String>,
}
