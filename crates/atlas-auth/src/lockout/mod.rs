//! Failed-login lockout tracking.
//!
//! Counters are keyed by the composite (network origin, login email), so
//! one origin hammering one account locks quickly while the blast radius
//! of a single origin is bounded. This only partially protects an
//! account from distributed sources — a documented limitation of the
//! composite key, not a bug.
//!
//! State lives in the shared [`CacheProvider`]. With the Redis provider
//! every request-handling process observes a failure before the next
//! attempt is evaluated; the in-memory provider is correct only for
//! single-instance deployments.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::warn;

use atlas_cache::keys;
use atlas_core::config::AuthConfig;
use atlas_core::error::AppError;
use atlas_core::traits::cache::CacheProvider;

/// Result of a lockout check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutStatus {
    /// Whether the identifier is currently locked.
    pub locked: bool,
    /// Seconds until the lock expires (0 when not locked).
    pub retry_after_seconds: u64,
}

impl LockoutStatus {
    /// An unlocked status.
    pub fn clear() -> Self {
        Self {
            locked: false,
            retry_after_seconds: 0,
        }
    }
}

/// Tracks failed-login counters and lock markers in the shared cache.
#[derive(Debug, Clone)]
pub struct LockoutGuard {
    /// Shared TTL-capable keyed store.
    cache: Arc<dyn CacheProvider>,
    /// Failures before the identifier locks.
    max_failed_attempts: u32,
    /// Lockout window.
    window: Duration,
}

impl LockoutGuard {
    /// Creates a new lockout guard over the shared cache.
    pub fn new(cache: Arc<dyn CacheProvider>, config: &AuthConfig) -> Self {
        Self {
            cache,
            max_failed_attempts: config.max_failed_attempts,
            window: Duration::from_secs(config.lockout_window_minutes * 60),
        }
    }

    /// Checks whether the identifier is currently locked.
    pub async fn check(&self, ip: &str, email: &str) -> Result<LockoutStatus, AppError> {
        let marker_key = keys::lockout_marker(ip, email);
        let Some(deadline) = self.cache.get(&marker_key).await? else {
            return Ok(LockoutStatus::clear());
        };

        // The marker stores the lock deadline as a unix timestamp; fall
        // back to the full window if it fails to parse.
        let retry_after_seconds = deadline
            .parse::<i64>()
            .ok()
            .map(|ts| (ts - Utc::now().timestamp()).max(1) as u64)
            .unwrap_or(self.window.as_secs());

        Ok(LockoutStatus {
            locked: true,
            retry_after_seconds,
        })
    }

    /// Records a failed attempt, locking the identifier at the threshold.
    /// Returns the consecutive failure count.
    pub async fn record_failure(&self, ip: &str, email: &str) -> Result<u32, AppError> {
        let counter_key = keys::lockout_counter(ip, email);
        let count = self.cache.incr(&counter_key).await?;
        if count == 1 {
            // The counter lives exactly one lockout window.
            self.cache.expire(&counter_key, self.window).await?;
        }

        if count >= self.max_failed_attempts as i64 {
            let deadline = Utc::now().timestamp() + self.window.as_secs() as i64;
            let marker_key = keys::lockout_marker(ip, email);
            self.cache
                .set(&marker_key, &deadline.to_string(), self.window)
                .await?;

            warn!(
                ip,
                email,
                failures = count,
                window_seconds = self.window.as_secs(),
                "Identifier locked out after repeated failures"
            );
        }

        Ok(count.max(0) as u32)
    }

    /// Clears the record on successful authentication.
    pub async fn record_success(&self, ip: &str, email: &str) -> Result<(), AppError> {
        self.cache.delete(&keys::lockout_counter(ip, email)).await?;
        self.cache.delete(&keys::lockout_marker(ip, email)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_cache::memory::MemoryCacheProvider;
    use atlas_core::config::cache::MemoryCacheConfig;

    fn guard() -> LockoutGuard {
        let cache = Arc::new(MemoryCacheProvider::new(
            &MemoryCacheConfig {
                max_capacity: 1000,
                time_to_live_seconds: 60,
            },
            60,
        ));
        LockoutGuard::new(
            cache,
            &AuthConfig {
                max_failed_attempts: 5,
                lockout_window_minutes: 15,
                ..AuthConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn test_locks_at_threshold() {
        let guard = guard();
        for i in 1..=4 {
            let count = guard.record_failure("10.0.0.1", "a@x.com").await.unwrap();
            assert_eq!(count, i);
            let status = guard.check("10.0.0.1", "a@x.com").await.unwrap();
            assert!(!status.locked);
        }

        guard.record_failure("10.0.0.1", "a@x.com").await.unwrap();
        let status = guard.check("10.0.0.1", "a@x.com").await.unwrap();
        assert!(status.locked);
        assert!(status.retry_after_seconds > 0);
    }

    #[tokio::test]
    async fn test_success_resets_counter() {
        let guard = guard();
        for _ in 0..4 {
            guard.record_failure("10.0.0.1", "a@x.com").await.unwrap();
        }
        guard.record_success("10.0.0.1", "a@x.com").await.unwrap();

        // Counter restarted: the next failure is attempt one again.
        let count = guard.record_failure("10.0.0.1", "a@x.com").await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_identifiers_are_independent() {
        let guard = guard();
        for _ in 0..5 {
            guard.record_failure("10.0.0.1", "a@x.com").await.unwrap();
        }
        assert!(guard.check("10.0.0.1", "a@x.com").await.unwrap().locked);
        // Same account, different origin: unaffected.
        assert!(!guard.check("10.0.0.2", "a@x.com").await.unwrap().locked);
        // Same origin, different account: unaffected.
        assert!(!guard.check("10.0.0.1", "b@x.com").await.unwrap().locked);
    }
}
