pub mod admin;
pub mod auth;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register          register (public)
/// /auth/login             login (public)
/// /auth/refresh           refresh (cookie + CSRF header)
/// /auth/logout            logout (requires auth)
/// /auth/logout-all        logout everywhere (requires auth)
/// /auth/sessions          list active sessions (requires auth)
/// /auth/sessions/{id}     revoke one session (requires auth)
///
/// /admin/blacklist        blacklist count / clear (admin only)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
}
