use crate::traits::CachePort;
use crate::types::EnrichmentResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

struct CacheEntry {
    value: EnrichmentResult,
    /// `None` when `write time + ttl` is not representable.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|at| now > at).unwrap_or(false)
    }
}

/// Process-wide in-memory cache. Expiry is lazy: an expired entry is purged
/// by the `get` that observes it; there is no background sweep.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries currently stored, including expired ones not yet read.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CachePort for MemoryCache {
    async fn get(&self, key: &str) -> Option<EnrichmentResult> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(Instant::now()) => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| e.is_expired(Instant::now())) {
            entries.remove(key);
            debug!("Cache entry expired: {}", key);
        }
        None
    }

    async fn set(&self, key: &str, value: EnrichmentResult, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now().checked_add(ttl),
        };
        self.entries.write().await.insert(key.to_string(), entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    fn value(title: &str) -> EnrichmentResult {
        EnrichmentResult {
            fake_title: title.to_string(),
            category: Category::Other,
        }
    }

    #[tokio::test]
    async fn miss_then_hit() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("k").await, None);

        cache.set("k", value("Cached headline"), Duration::from_secs(60)).await;
        assert_eq!(cache.get("k").await, Some(value("Cached headline")));
    }

    #[tokio::test]
    async fn set_overwrites() {
        let cache = MemoryCache::new();
        cache.set("k", value("first value"), Duration::from_secs(60)).await;
        cache.set("k", value("second value"), Duration::from_secs(60)).await;
        assert_eq!(cache.get("k").await, Some(value("second value")));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn expired_entries_are_purged_on_read() {
        let cache = MemoryCache::new();
        cache.set("short", value("short lived"), Duration::from_millis(20)).await;
        cache.set("long", value("long lived"), Duration::from_secs(60)).await;
        assert_eq!(cache.len().await, 2);

        tokio::time::sleep(Duration::from_millis(50)).await;

        // Nothing is swept until the expired key is read.
        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get("short").await, None);
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("long").await, Some(value("long lived")));
    }

    #[tokio::test]
    async fn huge_ttl_never_expires() {
        let cache = MemoryCache::new();
        cache.set("k", value("forever value"), Duration::MAX).await;
        assert!(cache.get("k").await.is_some());
        assert!(!cache.is_empty().await);
    }
}
