//! In-process blacklist backend.
//!
//! A mutex-guarded map from token hash to expiry instant. Dead entries are
//! purged lazily on access, so no background task is required. Suitable for
//! single-process deployments and tests; multi-instance deployments should
//! use the Redis backend so a logout on one instance is visible on all.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::{BlacklistStore, StoreError};

/// Mutex-guarded TTL map.
#[derive(Default)]
pub struct MemoryBlacklist {
    entries: Mutex<HashMap<String, Instant>>,
}

impl MemoryBlacklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop entries whose expiry has passed. Called under the lock.
    fn purge(entries: &mut HashMap<String, Instant>) {
        let now = Instant::now();
        entries.retain(|_, expires| *expires > now);
    }
}

#[async_trait]
impl BlacklistStore for MemoryBlacklist {
    async fn add(&self, hash: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        Self::purge(&mut entries);
        entries.insert(hash.to_string(), Instant::now() + ttl);
        Ok(())
    }

    async fn contains(&self, hash: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        Self::purge(&mut entries);
        Ok(entries.contains_key(hash))
    }

    async fn remove(&self, hash: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        Self::purge(&mut entries);
        Ok(entries.remove(hash).is_some())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        Self::purge(&mut entries);
        Ok(entries.len() as u64)
    }

    async fn clear(&self) -> Result<u64, StoreError> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        Self::purge(&mut entries);
        let removed = entries.len() as u64;
        entries.clear();
        Ok(removed)
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Unavailable("blacklist mutex poisoned".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_then_contains() {
        let store = MemoryBlacklist::new();
        store.add("hash-a", Duration::from_secs(60)).await.unwrap();

        assert!(store.contains("hash-a").await.unwrap());
        assert!(!store.contains("hash-b").await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let store = MemoryBlacklist::new();
        store.add("hash-a", Duration::from_millis(20)).await.unwrap();
        assert!(store.contains("hash-a").await.unwrap());

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!store.contains("hash-a").await.unwrap());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn remove_reports_presence() {
        let store = MemoryBlacklist::new();
        store.add("hash-a", Duration::from_secs(60)).await.unwrap();

        assert!(store.remove("hash-a").await.unwrap());
        assert!(!store.remove("hash-a").await.unwrap());
    }

    #[tokio::test]
    async fn clear_returns_removed_count() {
        let store = MemoryBlacklist::new();
        store.add("hash-a", Duration::from_secs(60)).await.unwrap();
        store.add("hash-b", Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.clear().await.unwrap(), 2);
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
