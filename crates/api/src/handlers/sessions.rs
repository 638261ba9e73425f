//! Handlers for the `/auth/sessions` resource: listing active sessions and
//! revoking one remotely.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use gatehouse_core::types::DbId;
use gatehouse_core::CoreError;
use gatehouse_db::models::session::SessionInfo;
use gatehouse_db::repositories::{RefreshTokenRepo, SessionRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/auth/sessions
///
/// List the caller's active sessions, each annotated with whether it is the
/// session behind the presented access token.
pub async fn list_sessions(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<SessionInfo>>>> {
    // Authenticated activity keeps the caller's session from idling out;
    // browsing the session list counts.
    SessionRepo::touch(&state.pool, auth_user.session_id).await?;

    let sessions = SessionRepo::list_active_for_user(&state.pool, auth_user.user_id).await?;
    let data = sessions
        .iter()
        .map(|s| SessionInfo::from_session(s, auth_user.session_id))
        .collect();

    Ok(Json(DataResponse { data }))
}

/// DELETE /api/v1/auth/sessions/{id}
///
/// Revoke one of the caller's sessions (e.g. "log out that other laptop").
/// 404 for an unknown id, 403 for a session owned by someone else.
pub async fn revoke_session(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let Some(session) = SessionRepo::find_by_id(&state.pool, id).await? else {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Session",
            id: id.to_string(),
        }));
    };

    if session.user_id != auth_user.user_id {
        tracing::warn!(
            user_id = auth_user.user_id,
            session_id = id,
            "attempt to revoke a foreign session"
        );
        return Err(AppError::Core(CoreError::Forbidden(
            "Session belongs to another user".into(),
        )));
    }

    SessionRepo::invalidate(&state.pool, session.id).await?;
    RefreshTokenRepo::revoke_by_id(&state.pool, session.refresh_token_id).await?;

    tracing::info!(user_id = auth_user.user_id, session_id = id, "session revoked");
    Ok(StatusCode::NO_CONTENT)
}
