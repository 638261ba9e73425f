//! Login-attempt rate limiting.
//!
//! Failed attempts are counted per (identifier, origin) pair within a sliding
//! window backed by the `login_attempts` table. Once the threshold is
//! reached, further attempts for that pair are rejected until the oldest
//! failures age out of the window. A successful login does not clear prior
//! failures inside the window; the limiter is window-based, not
//! counter-reset. Both the threshold and the window are configuration.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use gatehouse_db::repositories::LoginAttemptRepo;

/// Default: block after 5 failures.
const DEFAULT_MAX_FAILED_ATTEMPTS: i64 = 5;
/// Default trailing window in minutes.
const DEFAULT_WINDOW_MINS: i64 = 15;

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Failures allowed within the window before blocking.
    pub max_failed_attempts: i64,
    /// Trailing window length in minutes.
    pub window_mins: i64,
}

impl RateLimitConfig {
    /// Load rate-limiter configuration from environment variables.
    ///
    /// | Env Var                    | Default |
    /// |----------------------------|---------|
    /// | `LOGIN_MAX_FAILED_ATTEMPTS`| `5`     |
    /// | `LOGIN_WINDOW_MINS`        | `15`    |
    pub fn from_env() -> Self {
        let max_failed_attempts: i64 = std::env::var("LOGIN_MAX_FAILED_ATTEMPTS")
            .unwrap_or_else(|_| DEFAULT_MAX_FAILED_ATTEMPTS.to_string())
            .parse()
            .expect("LOGIN_MAX_FAILED_ATTEMPTS must be a valid i64");

        let window_mins: i64 = std::env::var("LOGIN_WINDOW_MINS")
            .unwrap_or_else(|_| DEFAULT_WINDOW_MINS.to_string())
            .parse()
            .expect("LOGIN_WINDOW_MINS must be a valid i64");

        Self {
            max_failed_attempts,
            window_mins,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: DEFAULT_MAX_FAILED_ATTEMPTS,
            window_mins: DEFAULT_WINDOW_MINS,
        }
    }
}

/// Record one login attempt for rate-limit accounting.
pub async fn record_attempt(
    pool: &PgPool,
    identifier: &str,
    origin: &str,
    succeeded: bool,
) -> Result<(), sqlx::Error> {
    LoginAttemptRepo::record(pool, identifier, origin, succeeded).await
}

/// Whether the (identifier, origin) pair has reached the failure threshold
/// within the trailing window.
///
/// Boundary: with a threshold of 5, the attempt after the 5th failure is the
/// first one blocked.
pub async fn is_blocked(
    pool: &PgPool,
    config: &RateLimitConfig,
    identifier: &str,
    origin: &str,
) -> Result<bool, sqlx::Error> {
    let cutoff = Utc::now() - Duration::minutes(config.window_mins);
    let failures =
        LoginAttemptRepo::failed_count_since(pool, identifier, origin, cutoff).await?;
    Ok(failures >= config.max_failed_attempts)
}
