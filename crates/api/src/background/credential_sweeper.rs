//! Periodic cleanup of expired credentials.
//!
//! Deletes refresh tokens past expiry, sessions that are expired or idle
//! beyond the inactivity ceiling, and login-attempt records older than the
//! rate-limit window. Runs on a fixed interval using `tokio::time::interval`
//! so no per-request path ever pays for garbage collection.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use gatehouse_db::repositories::{LoginAttemptRepo, RefreshTokenRepo, SessionRepo};

use crate::auth::rate_limit::RateLimitConfig;

/// How often the sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

/// Login attempts are kept a little past the window so a block that is about
/// to engage is not cut short by the sweep.
const ATTEMPT_RETENTION_SLACK_MINS: i64 = 5;

/// Run the credential sweep loop until `cancel` is triggered.
pub async fn run(pool: PgPool, rate_limit: RateLimitConfig, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = SWEEP_INTERVAL.as_secs(),
        "Credential sweeper started"
    );

    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Credential sweeper stopping");
                break;
            }
            _ = interval.tick() => {
                sweep_once(&pool, &rate_limit).await;
            }
        }
    }
}

/// One sweep pass. Failures are logged and retried on the next tick.
async fn sweep_once(pool: &PgPool, rate_limit: &RateLimitConfig) {
    match RefreshTokenRepo::delete_expired(pool).await {
        Ok(deleted) if deleted > 0 => {
            tracing::info!(deleted, "Credential sweep: purged expired refresh tokens");
        }
        Ok(_) => tracing::debug!("Credential sweep: no expired refresh tokens"),
        Err(e) => tracing::error!(error = %e, "Credential sweep: refresh token purge failed"),
    }

    match SessionRepo::sweep_expired(pool).await {
        Ok(deleted) if deleted > 0 => {
            tracing::info!(deleted, "Credential sweep: purged expired or idle sessions");
        }
        Ok(_) => tracing::debug!("Credential sweep: no expired sessions"),
        Err(e) => tracing::error!(error = %e, "Credential sweep: session purge failed"),
    }

    let cutoff =
        Utc::now() - chrono::Duration::minutes(rate_limit.window_mins + ATTEMPT_RETENTION_SLACK_MINS);
    match LoginAttemptRepo::delete_older_than(pool, cutoff).await {
        Ok(deleted) if deleted > 0 => {
            tracing::info!(deleted, "Credential sweep: purged old login attempts");
        }
        Ok(_) => tracing::debug!("Credential sweep: no old login attempts"),
        Err(e) => tracing::error!(error = %e, "Credential sweep: login attempt purge failed"),
    }
}
