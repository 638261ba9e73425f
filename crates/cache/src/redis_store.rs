//! Redis blacklist backend.
//!
//! Entries are `SET` with a server-side TTL, so Redis handles expiry on its
//! own. All keys share a prefix so `count`/`clear` can scan them without
//! touching unrelated keys in the same database.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::{BlacklistStore, StoreError};

/// Key prefix for blacklist entries.
const KEY_PREFIX: &str = "revoked:";

/// Blacklist entries live in Redis under `revoked:{token_hash}`.
#[derive(Clone)]
pub struct RedisBlacklist {
    conn: ConnectionManager,
}

impl RedisBlacklist {
    /// Connect to Redis and return a backend handle.
    ///
    /// The connection manager reconnects automatically; transient outages
    /// surface as [`StoreError::Unavailable`] and are absorbed by the
    /// caller's fail policy.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(to_store_error)?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(to_store_error)?;
        Ok(RedisBlacklist { conn })
    }

    fn key(hash: &str) -> String {
        format!("{KEY_PREFIX}{hash}")
    }

    /// Collect all blacklist keys via a prefix scan.
    async fn scan_keys(&self) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        let mut keys = Vec::new();
        let mut iter = conn
            .scan_match::<_, String>(format!("{KEY_PREFIX}*"))
            .await
            .map_err(to_store_error)?;
        while let Some(key) = iter.next_item().await {
            keys.push(key);
        }
        Ok(keys)
    }
}

#[async_trait]
impl BlacklistStore for RedisBlacklist {
    async fn add(&self, hash: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        // Redis rejects a zero expiry; the wrapper never passes one.
        let ttl_secs = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(Self::key(hash), 1u8, ttl_secs)
            .await
            .map_err(to_store_error)
    }

    async fn contains(&self, hash: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        conn.exists(Self::key(hash)).await.map_err(to_store_error)
    }

    async fn remove(&self, hash: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(Self::key(hash)).await.map_err(to_store_error)?;
        Ok(removed > 0)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.scan_keys().await?.len() as u64)
    }

    async fn clear(&self) -> Result<u64, StoreError> {
        let keys = self.scan_keys().await?;
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(keys).await.map_err(to_store_error)?;
        Ok(removed as u64)
    }
}

fn to_store_error(e: redis::RedisError) -> StoreError {
    StoreError::Unavailable(e.to_string())
}
