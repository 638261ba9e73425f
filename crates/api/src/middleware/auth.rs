//! JWT-based authentication extractor for Axum handlers.
//!
//! Verification order per protected request: Bearer token extraction,
//! signature + expiry validation, then the revocation blacklist. All
//! failures collapse to the same 401 for the client; the specific cause is
//! logged at debug level.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use gatehouse_core::types::DbId;
use gatehouse_core::CoreError;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from a JWT Bearer token in the
/// `Authorization` header.
///
/// Use this as an extractor parameter in any handler that requires
/// authentication:
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    /// The user's email (from `claims.email`).
    pub email: String,
    /// The user's role name (`"user"` or `"admin"`).
    pub role: String,
    /// The backing session id (from `claims.sid`).
    pub session_id: DbId,
    /// The raw access token, kept so logout can blacklist it.
    pub token: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

fn unauthenticated() -> AppError {
    AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|e| {
            tracing::debug!(error = %e, "access token validation failed");
            unauthenticated()
        })?;

        // Signature and expiry are fine; check for early revocation. Store
        // unavailability resolves via the configured fail policy inside the
        // cache, never as a 500.
        if state.revocation.is_blacklisted(token).await {
            tracing::debug!(user_id = claims.sub, "access token is blacklisted");
            return Err(unauthenticated());
        }

        Ok(AuthUser {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
            session_id: claims.sid,
            token: token.to_string(),
        })
    }
}
