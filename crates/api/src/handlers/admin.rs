//! Admin observability handlers for the revocation blacklist.
//!
//! These expose counts for monitoring; nothing here is security-critical.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use gatehouse_core::CoreError;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Response body for the blacklist endpoints.
#[derive(Debug, Serialize)]
pub struct BlacklistStats {
    pub count: u64,
}

fn require_admin(auth_user: &AuthUser) -> Result<(), AppError> {
    if auth_user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Forbidden(
            "Admin role required".into(),
        )))
    }
}

/// GET /api/v1/admin/blacklist
pub async fn blacklist_count(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<BlacklistStats>> {
    require_admin(&auth_user)?;
    let count = state.revocation.count().await;
    Ok(Json(BlacklistStats { count }))
}

/// DELETE /api/v1/admin/blacklist
///
/// Drop every blacklist entry. Affected access tokens become valid again
/// until their natural expiry; intended for maintenance, not routine use.
pub async fn blacklist_clear(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<BlacklistStats>> {
    require_admin(&auth_user)?;
    let cleared = state.revocation.clear().await;
    tracing::info!(cleared, admin_id = auth_user.user_id, "blacklist cleared");
    Ok(Json(BlacklistStats { count: cleared }))
}
