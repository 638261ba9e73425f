use std::sync::Arc;

use gatehouse_cache::RevocationCache;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already
/// `Clone`). Constructed once at startup and injected; no module-level
/// singletons.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: gatehouse_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Access-token revocation cache.
    pub revocation: Arc<RevocationCache>,
}
