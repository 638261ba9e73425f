//! Session registry model and DTOs.

use gatehouse_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A session row from the `sessions` table.
///
/// Bound to its backing refresh token through `refresh_token_id`; the pair is
/// created, rotated, and torn down together.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: DbId,
    pub user_id: DbId,
    pub refresh_token_id: DbId,
    pub csrf_token: String,
    pub expires_at: Timestamp,
    pub last_activity_at: Timestamp,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub device_fingerprint: Option<String>,
    pub active: bool,
    pub created_at: Timestamp,
}

/// DTO for creating a new session.
pub struct CreateSession {
    pub user_id: DbId,
    pub refresh_token_id: DbId,
    pub csrf_token: String,
    pub expires_at: Timestamp,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub device_fingerprint: Option<String>,
}

/// Safe session representation for API responses (no CSRF token).
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: DbId,
    pub created_at: Timestamp,
    pub last_activity_at: Timestamp,
    pub expires_at: Timestamp,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    /// Whether this is the caller's own session.
    pub current: bool,
}

impl SessionInfo {
    pub fn from_session(session: &Session, current_session_id: DbId) -> Self {
        SessionInfo {
            id: session.id,
            created_at: session.created_at,
            last_activity_at: session.last_activity_at,
            expires_at: session.expires_at,
            ip_address: session.ip_address.clone(),
            user_agent: session.user_agent.clone(),
            current: session.id == current_session_id,
        }
    }
}
