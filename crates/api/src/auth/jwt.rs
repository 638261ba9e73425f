//! JWT access-token generation and validation.
//!
//! Access tokens are HS256-signed JWTs containing a [`Claims`] payload. They
//! are never stored server-side; revocation before natural expiry goes
//! through the blacklist in `gatehouse-cache`, keyed by the token's hash.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gatehouse_core::types::DbId;

/// JWT claims embedded in every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's internal database id.
    pub sub: DbId,
    /// The user's email.
    pub email: String,
    /// The user's role name (`"user"` or `"admin"`).
    pub role: String,
    /// The backing session id, so logout and session listing can identify
    /// the caller's own session.
    pub sid: DbId,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4) for audit trails.
    pub jti: String,
}

/// Configuration for JWT token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Access token lifetime in minutes (default: 15).
    pub access_token_expiry_mins: i64,
    /// Refresh token lifetime in days for ordinary sessions (default: 7).
    pub refresh_token_expiry_days: i64,
    /// Refresh token lifetime in days for "remember me" sessions (default: 30).
    pub remember_me_expiry_days: i64,
}

/// Default access token expiry in minutes.
const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;
/// Default refresh token expiry in days.
const DEFAULT_REFRESH_EXPIRY_DAYS: i64 = 7;
/// Default "remember me" refresh token expiry in days.
const DEFAULT_REMEMBER_ME_EXPIRY_DAYS: i64 = 30;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                      | Required | Default |
    /// |------------------------------|----------|---------|
    /// | `JWT_SECRET`                 | **yes**  | --      |
    /// | `JWT_ACCESS_EXPIRY_MINS`     | no       | `15`    |
    /// | `JWT_REFRESH_EXPIRY_DAYS`    | no       | `7`     |
    /// | `JWT_REMEMBER_ME_EXPIRY_DAYS`| no       | `30`    |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty: a missing signing
    /// secret is a configuration error the process must not start with.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let access_token_expiry_mins: i64 = std::env::var("JWT_ACCESS_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_EXPIRY_MINS.to_string())
            .parse()
            .expect("JWT_ACCESS_EXPIRY_MINS must be a valid i64");

        let refresh_token_expiry_days: i64 = std::env::var("JWT_REFRESH_EXPIRY_DAYS")
            .unwrap_or_else(|_| DEFAULT_REFRESH_EXPIRY_DAYS.to_string())
            .parse()
            .expect("JWT_REFRESH_EXPIRY_DAYS must be a valid i64");

        let remember_me_expiry_days: i64 = std::env::var("JWT_REMEMBER_ME_EXPIRY_DAYS")
            .unwrap_or_else(|_| DEFAULT_REMEMBER_ME_EXPIRY_DAYS.to_string())
            .parse()
            .expect("JWT_REMEMBER_ME_EXPIRY_DAYS must be a valid i64");

        Self {
            secret,
            access_token_expiry_mins,
            refresh_token_expiry_days,
            remember_me_expiry_days,
        }
    }

    /// Refresh token lifetime in days for the given session kind.
    pub fn refresh_expiry_days(&self, remember_me: bool) -> i64 {
        if remember_me {
            self.remember_me_expiry_days
        } else {
            self.refresh_token_expiry_days
        }
    }
}

/// Generate an HS256 access token for the given user and session.
pub fn generate_access_token(
    user_id: DbId,
    email: &str,
    role: &str,
    session_id: DbId,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let exp = now + config.access_token_expiry_mins * 60;

    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        role: role.to_string(),
        sid: session_id,
        exp,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Validate and decode an access token, returning the embedded [`Claims`].
///
/// Validates the signature and expiration. Expired and malformed tokens fail
/// with distinct `jsonwebtoken` error kinds so callers can log them
/// differently; both map to the same 401 for clients.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    use jsonwebtoken::errors::ErrorKind;

    /// Helper to build a test config with a known secret.
    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
            remember_me_expiry_days: 30,
        }
    }

    #[test]
    fn generate_and_validate_round_trip() {
        let config = test_config();
        let token = generate_access_token(42, "admin@test.com", "admin", 7, &config)
            .expect("token generation should succeed");

        let claims = validate_token(&token, &config).expect("token validation should succeed");
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "admin@test.com");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.sid, 7);
        assert!(claims.exp > claims.iat);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn expired_token_fails_with_expired_kind() {
        let config = test_config();

        // Manually create an already-expired token, well beyond the default
        // 60-second leeway.
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            email: "user@test.com".to_string(),
            role: "user".to_string(),
            sid: 1,
            exp: now - 300,
            iat: now - 600,
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .expect("encoding should succeed");

        let err = validate_token(&token, &config).expect_err("expired token must fail");
        assert!(matches!(err.kind(), ErrorKind::ExpiredSignature));
    }

    #[test]
    fn wrong_secret_fails() {
        let config_a = test_config();
        let config_b = JwtConfig {
            secret: "a-completely-different-secret".to_string(),
            ..test_config()
        };

        let token = generate_access_token(1, "user@test.com", "user", 1, &config_a)
            .expect("token generation should succeed");

        assert!(
            validate_token(&token, &config_b).is_err(),
            "token signed with a different secret must fail"
        );
    }

    #[test]
    fn remember_me_selects_long_expiry() {
        let config = test_config();
        assert_eq!(config.refresh_expiry_days(false), 7);
        assert_eq!(config.refresh_expiry_days(true), 30);
    }
}
