use gatehouse_cache::FailPolicy;

use crate::auth::jwt::JwtConfig;
use crate::auth::rate_limit::RateLimitConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
    /// Login rate-limiter thresholds.
    pub rate_limit: RateLimitConfig,
    /// Revocation cache configuration.
    pub revocation: RevocationConfig,
    /// Whether refresh cookies require HTTPS (default: `true`; disable for
    /// local development and tests).
    pub cookie_secure: bool,
}

/// Revocation cache configuration.
#[derive(Debug, Clone)]
pub struct RevocationConfig {
    /// Redis URL for the shared blacklist; `None` selects the in-process
    /// backend.
    pub redis_url: Option<String>,
    /// Behavior when the backing store is unreachable.
    pub fail_policy: FailPolicy,
}

impl RevocationConfig {
    /// Load revocation cache configuration from environment variables.
    ///
    /// | Env Var                  | Default            |
    /// |--------------------------|--------------------|
    /// | `REVOCATION_REDIS_URL`   | unset (in-process) |
    /// | `REVOCATION_FAIL_POLICY` | `open`             |
    pub fn from_env() -> Self {
        let redis_url = std::env::var("REVOCATION_REDIS_URL").ok().filter(|v| !v.is_empty());

        let fail_policy = std::env::var("REVOCATION_FAIL_POLICY")
            .unwrap_or_else(|_| "open".into())
            .parse()
            .expect("REVOCATION_FAIL_POLICY must be 'open' or 'closed'");

        Self {
            redis_url,
            fail_policy,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `COOKIE_SECURE`        | `true`                     |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let cookie_secure: bool = std::env::var("COOKIE_SECURE")
            .unwrap_or_else(|_| "true".into())
            .parse()
            .expect("COOKIE_SECURE must be 'true' or 'false'");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
            revocation: RevocationConfig::from_env(),
            cookie_secure,
        }
    }
}
