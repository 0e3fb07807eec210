//! Pluggable token revocation list.
//!
//! The auth gateway consults the blacklist before cryptographic
//! verification. The default implementation never revokes; a
//! cache-backed implementation is provided for deployments that need
//! an operational kill switch for individual tokens.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use atlas_core::result::AppResult;
use atlas_core::traits::cache::CacheProvider;

use crate::session::token_digest;

/// Revocation list consulted for every bearer token.
#[async_trait]
pub trait TokenBlacklist: Send + Sync + std::fmt::Debug + 'static {
    /// Whether the given raw token has been revoked.
    async fn contains(&self, token: &str) -> AppResult<bool>;
}

/// Default blacklist: nothing is ever revoked.
///
/// Individual access tokens stay valid until natural expiry; revocation
/// acts on sessions (refresh tokens) instead.
#[derive(Debug, Clone, Default)]
pub struct NoopBlacklist;

#[async_trait]
impl TokenBlacklist for NoopBlacklist {
    async fn contains(&self, _token: &str) -> AppResult<bool> {
        Ok(false)
    }
}

/// Cache-backed blacklist storing token digests with a TTL.
#[derive(Debug, Clone)]
pub struct CacheBlacklist {
    cache: Arc<dyn CacheProvider>,
}

impl CacheBlacklist {
    /// Creates a blacklist over the shared cache.
    pub fn new(cache: Arc<dyn CacheProvider>) -> Self {
        Self { cache }
    }

    /// Revokes a raw token for the given remaining lifetime.
    pub async fn insert(&self, token: &str, remaining: Duration) -> AppResult<()> {
        let key = atlas_cache::keys::token_blacklist(&token_digest(token));
        // A minimum TTL avoids zero-length entries racing the check.
        let ttl = remaining.max(Duration::from_secs(60));
        self.cache.set(&key, "revoked", ttl).await
    }
}

#[async_trait]
impl TokenBlacklist for CacheBlacklist {
    async fn contains(&self, token: &str) -> AppResult<bool> {
        let key = atlas_cache::keys::token_blacklist(&token_digest(token));
        Ok(self.cache.get(&key).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_cache::memory::MemoryCacheProvider;
    use atlas_core::config::cache::MemoryCacheConfig;

    fn cache() -> Arc<MemoryCacheProvider> {
        Arc::new(MemoryCacheProvider::new(
            &MemoryCacheConfig {
                max_capacity: 100,
                time_to_live_seconds: 60,
            },
            60,
        ))
    }

    #[tokio::test]
    async fn test_noop_never_revokes() {
        assert!(!NoopBlacklist.contains("any-token").await.unwrap());
    }

    #[tokio::test]
    async fn test_cache_blacklist_round_trip() {
        let blacklist = CacheBlacklist::new(cache());
        assert!(!blacklist.contains("tok").await.unwrap());

        blacklist
            .insert("tok", Duration::from_secs(120))
            .await
            .unwrap();
        assert!(blacklist.contains("tok").await.unwrap());
        assert!(!blacklist.contains("other").await.unwrap());
    }
}
