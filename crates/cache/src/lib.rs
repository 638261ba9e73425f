//! Access-token revocation cache.
//!
//! Access tokens are stateless JWTs, so a logout cannot invalidate one before
//! its natural expiry. This crate provides a best-effort blacklist keyed by
//! the SHA-256 hash of the token, with a TTL equal to the token's remaining
//! lifetime. Two backends implement the [`BlacklistStore`] capability trait:
//! an in-process map ([`memory::MemoryBlacklist`]) and Redis
//! ([`redis_store::RedisBlacklist`]).
//!
//! [`RevocationCache`] wraps a store together with a [`FailPolicy`]: when the
//! backing store is unreachable, fail-open keeps serving (signature + expiry
//! remain the only checks) while fail-closed rejects every token. Fail-open
//! is the default; the tradeoff is availability against the immediate-
//! revocation guarantee.

pub mod memory;
pub mod redis_store;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{DecodingKey, Validation};
use serde::Deserialize;

use gatehouse_core::token::hash_token;

/// Error from a blacklist backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("blacklist store unavailable: {0}")]
    Unavailable(String),
}

/// Capability interface for a blacklist backend.
///
/// Keys are token hashes, never plaintext tokens. Entries self-expire after
/// their TTL.
#[async_trait]
pub trait BlacklistStore: Send + Sync {
    /// Store `hash` with the given time-to-live.
    async fn add(&self, hash: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Whether `hash` is currently blacklisted.
    async fn contains(&self, hash: &str) -> Result<bool, StoreError>;

    /// Remove `hash`. Returns whether an entry existed.
    async fn remove(&self, hash: &str) -> Result<bool, StoreError>;

    /// Number of live entries.
    async fn count(&self) -> Result<u64, StoreError>;

    /// Remove every entry. Returns the number removed.
    async fn clear(&self) -> Result<u64, StoreError>;
}

/// Behavior when the backing store is unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailPolicy {
    /// Treat tokens as not blacklisted; signature and expiry still apply.
    #[default]
    Open,
    /// Treat every token as blacklisted until the store recovers.
    Closed,
}

impl FromStr for FailPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(FailPolicy::Open),
            "closed" => Ok(FailPolicy::Closed),
            other => Err(format!("unknown fail policy '{other}' (expected 'open' or 'closed')")),
        }
    }
}

/// Expiry claim extracted from a token without signature verification.
///
/// The expiry is public data once the token is issued, and a forged expiry
/// only shortens or lengthens a blacklist entry for a token that will fail
/// signature verification anyway.
#[derive(Debug, Deserialize)]
struct ExpClaim {
    exp: i64,
}

/// The revocation cache: a blacklist store plus a fail policy.
pub struct RevocationCache {
    store: Arc<dyn BlacklistStore>,
    policy: FailPolicy,
}

impl RevocationCache {
    pub fn new(store: Arc<dyn BlacklistStore>, policy: FailPolicy) -> Self {
        RevocationCache { store, policy }
    }

    pub fn policy(&self) -> FailPolicy {
        self.policy
    }

    /// Blacklist an access token for the remainder of its lifetime.
    ///
    /// Returns `false` (a no-op, not an error) when the token carries no
    /// usable expiry or the store is unreachable -- revocation precision is
    /// reduced, the request that triggered it still succeeds.
    pub async fn blacklist(&self, access_token: &str) -> bool {
        let Some(remaining) = remaining_lifetime(access_token) else {
            tracing::debug!("not blacklisting token without remaining lifetime");
            return false;
        };

        let hash = hash_token(access_token);
        match self.store.add(&hash, remaining).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "failed to blacklist access token");
                false
            }
        }
    }

    /// Whether an access token has been blacklisted.
    ///
    /// Store unavailability is resolved by the configured [`FailPolicy`] and
    /// never surfaces as a request error.
    pub async fn is_blacklisted(&self, access_token: &str) -> bool {
        let hash = hash_token(access_token);
        match self.store.contains(&hash).await {
            Ok(listed) => listed,
            Err(e) => match self.policy {
                FailPolicy::Open => {
                    tracing::warn!(error = %e, "blacklist unavailable, failing open");
                    false
                }
                FailPolicy::Closed => {
                    tracing::warn!(error = %e, "blacklist unavailable, failing closed");
                    true
                }
            },
        }
    }

    /// Remove a token from the blacklist. Administrative.
    pub async fn unblacklist(&self, access_token: &str) -> bool {
        let hash = hash_token(access_token);
        match self.store.remove(&hash).await {
            Ok(removed) => removed,
            Err(e) => {
                tracing::warn!(error = %e, "failed to unblacklist access token");
                false
            }
        }
    }

    /// Number of live blacklist entries. Observability only.
    pub async fn count(&self) -> u64 {
        self.store.count().await.unwrap_or(0)
    }

    /// Drop every blacklist entry. Returns the number removed.
    pub async fn clear(&self) -> u64 {
        self.store.clear().await.unwrap_or(0)
    }
}

/// Decode the `exp` claim without verifying the signature and return the
/// remaining lifetime, or `None` if the claim is missing or already past.
fn remaining_lifetime(token: &str) -> Option<Duration> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;

    let data =
        jsonwebtoken::decode::<ExpClaim>(token, &DecodingKey::from_secret(&[]), &validation)
            .ok()?;

    let remaining = data.claims.exp - chrono::Utc::now().timestamp();
    if remaining <= 0 {
        return None;
    }
    Some(Duration::from_secs(remaining as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims {
        sub: i64,
        exp: i64,
    }

    fn make_token(exp_offset_secs: i64) -> String {
        let claims = TestClaims {
            sub: 1,
            exp: chrono::Utc::now().timestamp() + exp_offset_secs,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .expect("encoding should succeed")
    }

    /// A store that always errors, for fail-policy tests.
    struct BrokenStore;

    #[async_trait]
    impl BlacklistStore for BrokenStore {
        async fn add(&self, _hash: &str, _ttl: Duration) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn contains(&self, _hash: &str) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn remove(&self, _hash: &str) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn count(&self) -> Result<u64, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn clear(&self) -> Result<u64, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    #[test]
    fn remaining_lifetime_for_live_token() {
        let token = make_token(300);
        let remaining = remaining_lifetime(&token).expect("live token has a lifetime");
        assert!(remaining.as_secs() > 290 && remaining.as_secs() <= 300);
    }

    #[test]
    fn remaining_lifetime_for_expired_token_is_none() {
        let token = make_token(-10);
        assert!(remaining_lifetime(&token).is_none());
    }

    #[test]
    fn remaining_lifetime_for_garbage_is_none() {
        assert!(remaining_lifetime("not-a-jwt").is_none());
    }

    #[test]
    fn fail_policy_parsing() {
        assert_eq!("open".parse::<FailPolicy>().unwrap(), FailPolicy::Open);
        assert_eq!("CLOSED".parse::<FailPolicy>().unwrap(), FailPolicy::Closed);
        assert!("maybe".parse::<FailPolicy>().is_err());
    }

    #[tokio::test]
    async fn fail_open_treats_token_as_clean() {
        let cache = RevocationCache::new(Arc::new(BrokenStore), FailPolicy::Open);
        assert!(!cache.is_blacklisted(&make_token(300)).await);
    }

    #[tokio::test]
    async fn fail_closed_treats_token_as_blacklisted() {
        let cache = RevocationCache::new(Arc::new(BrokenStore), FailPolicy::Closed);
        assert!(cache.is_blacklisted(&make_token(300)).await);
    }

    #[tokio::test]
    async fn unblacklist_restores_a_token() {
        use crate::memory::MemoryBlacklist;

        let cache = RevocationCache::new(Arc::new(MemoryBlacklist::new()), FailPolicy::Open);
        let token = make_token(300);

        assert!(cache.blacklist(&token).await);
        assert!(cache.is_blacklisted(&token).await);

        assert!(cache.unblacklist(&token).await);
        assert!(!cache.is_blacklisted(&token).await);
        assert!(!cache.unblacklist(&token).await, "second removal reports no entry");
    }

    #[tokio::test]
    async fn blacklist_with_broken_store_is_a_noop() {
        let cache = RevocationCache::new(Arc::new(BrokenStore), FailPolicy::Open);
        assert!(!cache.blacklist(&make_token(300)).await);
        assert_eq!(cache.count().await, 0);
    }
}
