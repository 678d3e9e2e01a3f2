//! Optional TTL cache boundary.
//!
//! The cache is an accelerator, never a dependency: every operation is
//! infallible at the trait surface, and a backend that is down or degraded
//! behaves as an always-miss. Values are stored as serialized strings so the
//! same backend can hold embedding vectors and search-result lists.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::{Duration, Instant};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait CacheService: Send + Sync {
    /// Fetch a value. A miss, an expired entry, and an unavailable backend
    /// are indistinguishable: all return `None`.
    fn get(&self, key: &str) -> BoxFuture<'_, Option<String>>;

    /// Store a value with a time-to-live. Best-effort: failures are logged
    /// by the implementation and otherwise swallowed.
    fn set(&self, key: &str, value: String, ttl: Duration) -> BoxFuture<'_, ()>;

    /// Drop every entry whose key starts with `prefix`.
    fn remove_prefix(&self, prefix: &str) -> BoxFuture<'_, ()>;
}

struct Entry {
    value: String,
    expires_at: Instant,
}

/// Process-local cache backed by a mutex-guarded map.
///
/// Expired entries are dropped lazily on read and swept on write, so the map
/// stays bounded by the live working set.
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |e| e.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCache")
            .field("entries", &self.len())
            .finish()
    }
}

impl CacheService for InMemoryCache {
    fn get(&self, key: &str) -> BoxFuture<'_, Option<String>> {
        let key = key.to_owned();
        Box::pin(async move {
            let Ok(mut entries) = self.entries.lock() else {
                return None;
            };
            match entries.get(&key) {
                Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
                Some(_) => {
                    entries.remove(&key);
                    None
                }
                None => None,
            }
        })
    }

    fn set(&self, key: &str, value: String, ttl: Duration) -> BoxFuture<'_, ()> {
        let key = key.to_owned();
        Box::pin(async move {
            let Ok(mut entries) = self.entries.lock() else {
                tracing::warn!("cache mutex poisoned, dropping write");
                return;
            };
            let now = Instant::now();
            entries.retain(|_, e| e.expires_at > now);
            entries.insert(
                key,
                Entry {
                    value,
                    expires_at: now + ttl,
                },
            );
        })
    }

    fn remove_prefix(&self, prefix: &str) -> BoxFuture<'_, ()> {
        let prefix = prefix.to_owned();
        Box::pin(async move {
            if let Ok(mut entries) = self.entries.lock() {
                entries.retain(|k, _| !k.starts_with(&prefix));
            }
        })
    }
}

/// Cache that never hits. Stands in when caching is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

impl CacheService for NoopCache {
    fn get(&self, _key: &str) -> BoxFuture<'_, Option<String>> {
        Box::pin(async { None })
    }

    fn set(&self, _key: &str, _value: String, _ttl: Duration) -> BoxFuture<'_, ()> {
        Box::pin(async {})
    }

    fn remove_prefix(&self, _prefix: &str) -> BoxFuture<'_, ()> {
        Box::pin(async {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get() {
        let cache = InMemoryCache::new();
        cache
            .set("embedding:abc", "[1.0,2.0]".into(), Duration::from_secs(60))
            .await;
        assert_eq!(cache.get("embedding:abc").await.as_deref(), Some("[1.0,2.0]"));
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let cache = InMemoryCache::new();
        assert!(cache.get("nope").await.is_none());
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss() {
        let cache = InMemoryCache::new();
        cache.set("k", "v".into(), Duration::ZERO).await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn expired_entry_is_evicted_on_read() {
        let cache = InMemoryCache::new();
        cache.set("k", "v".into(), Duration::ZERO).await;
        let _ = cache.get("k").await;
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn remove_prefix_drops_matching_keys_only() {
        let cache = InMemoryCache::new();
        let ttl = Duration::from_secs(60);
        cache.set("search:7:aaa", "x".into(), ttl).await;
        cache.set("search:7:bbb", "y".into(), ttl).await;
        cache.set("search:8:ccc", "z".into(), ttl).await;
        cache.set("embedding:ddd", "w".into(), ttl).await;

        cache.remove_prefix("search:7:").await;

        assert!(cache.get("search:7:aaa").await.is_none());
        assert!(cache.get("search:7:bbb").await.is_none());
        assert!(cache.get("search:8:ccc").await.is_some());
        assert!(cache.get("embedding:ddd").await.is_some());
    }

    #[tokio::test]
    async fn overwrite_replaces_value() {
        let cache = InMemoryCache::new();
        let ttl = Duration::from_secs(60);
        cache.set("k", "old".into(), ttl).await;
        cache.set("k", "new".into(), ttl).await;
        assert_eq!(cache.get("k").await.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn noop_cache_never_hits() {
        let cache = NoopCache;
        cache.set("k", "v".into(), Duration::from_secs(60)).await;
        assert!(cache.get("k").await.is_none());
    }
}
