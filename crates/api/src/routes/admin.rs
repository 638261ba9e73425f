//! Route definitions for the `/admin` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin` (admin role enforced in the handlers).
///
/// ```text
/// GET    /blacklist -> blacklist_count
/// DELETE /blacklist -> blacklist_clear
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/blacklist",
        get(admin::blacklist_count).delete(admin::blacklist_clear),
    )
}
