//! Route definitions for the `/auth` resource.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{auth, sessions};
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST   /register       -> register
/// POST   /login          -> login
/// POST   /refresh        -> refresh (cookie + CSRF header)
/// POST   /logout         -> logout (requires auth)
/// POST   /logout-all     -> logout_all (requires auth)
/// GET    /sessions       -> list_sessions (requires auth)
/// DELETE /sessions/{id}  -> revoke_session (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/logout-all", post(auth::logout_all))
        .route("/sessions", get(sessions::list_sessions))
        .route("/sessions/{id}", delete(sessions::revoke_session))
}
