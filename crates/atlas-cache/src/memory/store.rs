//! In-memory cache implementation using the moka crate.
//!
//! Valid only for single-instance deployments: nothing stored here is
//! visible to other processes. Counters live in a dashmap so that
//! increments are atomic per key and carry their own expiry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;

use atlas_core::config::cache::MemoryCacheConfig;
use atlas_core::result::AppResult;
use atlas_core::traits::cache::CacheProvider;

/// A cached string value carrying its own TTL.
#[derive(Debug, Clone)]
struct CachedValue {
    value: String,
    ttl: Duration,
}

/// Per-entry TTL policy: each value expires after its own `ttl`.
struct PerEntryTtl;

impl Expiry<String, CachedValue> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// An integer counter with an optional expiry deadline.
#[derive(Debug)]
struct CounterEntry {
    value: i64,
    expires_at: Option<Instant>,
}

impl CounterEntry {
    fn is_expired(&self) -> bool {
        matches!(self.expires_at, Some(deadline) if Instant::now() >= deadline)
    }
}

/// In-memory cache provider using moka for values and dashmap for counters.
#[derive(Debug, Clone)]
pub struct MemoryCacheProvider {
    /// The underlying moka cache for string values.
    cache: Cache<String, CachedValue>,
    /// Default TTL for entries.
    default_ttl: Duration,
    /// Counters stored separately so increments are atomic per key.
    counters: Arc<dashmap::DashMap<String, CounterEntry>>,
}

impl MemoryCacheProvider {
    /// Create a new in-memory cache from configuration.
    pub fn new(config: &MemoryCacheConfig, default_ttl_seconds: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        Self {
            cache,
            default_ttl: Duration::from_secs(default_ttl_seconds),
            counters: Arc::new(dashmap::DashMap::new()),
        }
    }

    /// Read a live counter value, purging the entry when expired.
    fn live_counter(&self, key: &str) -> Option<i64> {
        let expired = match self.counters.get(key) {
            Some(entry) if entry.is_expired() => true,
            Some(entry) => return Some(entry.value),
            None => return None,
        };
        if expired {
            self.counters.remove(key);
        }
        None
    }
}

#[async_trait]
impl CacheProvider for MemoryCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        if let Some(value) = self.live_counter(key) {
            return Ok(Some(value.to_string()));
        }
        Ok(self.cache.get(key).await.map(|v| v.value))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.counters.remove(key);
        self.cache
            .insert(
                key.to_string(),
                CachedValue {
                    value: value.to_string(),
                    ttl,
                },
            )
            .await;
        Ok(())
    }

    async fn set_default(&self, key: &str, value: &str) -> AppResult<()> {
        self.set(key, value, self.default_ttl).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.cache.remove(key).await;
        self.counters.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.live_counter(key).is_some() || self.cache.contains_key(key))
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool> {
        // Get-then-insert is not perfectly atomic, which is acceptable
        // for in-memory single-node use.
        if self.cache.contains_key(key) || self.live_counter(key).is_some() {
            return Ok(false);
        }
        self.set(key, value, ttl).await?;
        Ok(true)
    }

    async fn incr(&self, key: &str) -> AppResult<i64> {
        let mut entry = self.counters.entry(key.to_string()).or_insert(CounterEntry {
            value: 0,
            expires_at: None,
        });
        if entry.is_expired() {
            entry.value = 0;
            entry.expires_at = None;
        }
        entry.value += 1;
        Ok(entry.value)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<bool> {
        if let Some(mut entry) = self.counters.get_mut(key) {
            if !entry.is_expired() {
                entry.expires_at = Some(Instant::now() + ttl);
                return Ok(true);
            }
        }
        if let Some(cached) = self.cache.get(key).await {
            self.cache
                .insert(
                    key.to_string(),
                    CachedValue {
                        value: cached.value,
                        ttl,
                    },
                )
                .await;
            return Ok(true);
        }
        Ok(false)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn flush_all(&self) -> AppResult<()> {
        self.cache.invalidate_all();
        self.counters.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_core::config::cache::MemoryCacheConfig;

    fn make_provider() -> MemoryCacheProvider {
        let config = MemoryCacheConfig {
            max_capacity: 1000,
            time_to_live_seconds: 60,
        };
        MemoryCacheProvider::new(&config, 60)
    }

    #[tokio::test]
    async fn test_set_get() {
        let provider = make_provider();
        provider
            .set("key1", "value1", Duration::from_secs(60))
            .await
            .unwrap();
        let val = provider.get("key1").await.unwrap();
        assert_eq!(val, Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_delete() {
        let provider = make_provider();
        provider
            .set("key2", "value2", Duration::from_secs(60))
            .await
            .unwrap();
        provider.delete("key2").await.unwrap();
        let val = provider.get("key2").await.unwrap();
        assert_eq!(val, None);
    }

    #[tokio::test]
    async fn test_incr_is_readable_via_get() {
        let provider = make_provider();
        let v1 = provider.incr("counter").await.unwrap();
        assert_eq!(v1, 1);
        let v2 = provider.incr("counter").await.unwrap();
        assert_eq!(v2, 2);
        let read = provider.get("counter").await.unwrap();
        assert_eq!(read, Some("2".to_string()));
    }

    #[tokio::test]
    async fn test_counter_expiry_resets() {
        let provider = make_provider();
        provider.incr("lockme").await.unwrap();
        provider
            .expire("lockme", Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        // Expired counter restarts from zero.
        let v = provider.incr("lockme").await.unwrap();
        assert_eq!(v, 1);
    }

    #[tokio::test]
    async fn test_set_nx() {
        let provider = make_provider();
        let first = provider
            .set_nx("nx_key", "val", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(first);
        let second = provider
            .set_nx("nx_key", "val2", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(!second);
    }

    #[tokio::test]
    async fn test_health_check() {
        let provider = make_provider();
        assert!(provider.health_check().await.unwrap());
    }
}
