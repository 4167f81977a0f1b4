//! In-memory TTL cache - the default backend, and the fallback when Redis is unavailable.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;

use innerspell_core::ports::{Cache, CacheError, CacheStats};
use innerspell_core::{Clock, SystemClock};

/// TTL applied when `set` is called without one.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

struct CacheEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// In-memory cache using a HashMap behind an async RwLock.
///
/// Expired entries are dropped lazily by `get`, or in bulk by `purge_expired`.
/// Note: Data is lost on process restart and is not shared between instances.
pub struct InMemoryCache {
    store: RwLock<HashMap<String, CacheEntry>>,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::with_default_ttl(DEFAULT_TTL)
    }

    pub fn with_default_ttl(default_ttl: Duration) -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
            default_ttl,
            clock: Arc::new(SystemClock),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Replace the time source (used by tests).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn from_env() -> Self {
        let default_ttl = Duration::from_secs(
            std::env::var("CACHE_DEFAULT_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TTL.as_secs()),
        );
        Self::with_default_ttl(default_ttl)
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    fn expiry_for(&self, ttl: Duration) -> DateTime<Utc> {
        TimeDelta::from_std(ttl)
            .ok()
            .and_then(|ttl| self.clock.now().checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Live value for `key`, evicting it if it has expired.
    async fn lookup(&self, key: &str) -> Option<String> {
        let now = self.clock.now();
        {
            let store = self.store.read().await;
            let entry = store.get(key)?;
            if !entry.is_expired(now) {
                return Some(entry.value.clone());
            }
        }

        // Re-check under the write lock: a concurrent `set` may have refreshed it.
        let mut store = self.store.write().await;
        if store.get(key).is_some_and(|e| e.is_expired(now)) {
            store.remove(key);
        }
        None
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let value = self.lookup(key).await;
        let counter = if value.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        value
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let expires_at = self.expiry_for(ttl.unwrap_or(self.default_ttl));

        let mut store = self.store.write().await;
        store.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at,
            },
        );

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut store = self.store.write().await;
        store.remove(key);
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize, CacheError> {
        let mut store = self.store.write().await;
        let before = store.len();
        store.retain(|key, _| !key.contains(pattern));
        let removed = before - store.len();

        tracing::debug!(pattern = %pattern, removed, "Cache entries invalidated");
        Ok(removed)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.store.write().await.clear();
        Ok(())
    }

    async fn exists(&self, key: &str) -> bool {
        self.lookup(key).await.is_some()
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        let now = self.clock.now();
        let store = self.store.read().await;
        let expired = store.values().filter(|e| e.is_expired(now)).count();

        Ok(CacheStats::new(
            store.len(),
            expired,
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        ))
    }

    async fn purge_expired(&self) -> Result<usize, CacheError> {
        let now = self.clock.now();
        let mut store = self.store.write().await;
        let before = store.len();
        store.retain(|_, entry| !entry.is_expired(now));
        Ok(before - store.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use innerspell_core::ManualClock;

    fn cache_with_clock() -> (InMemoryCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        let cache = InMemoryCache::new().with_clock(clock.clone());
        (cache, clock)
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = InMemoryCache::new();
        cache
            .set("key1", "value1", Some(Duration::from_secs(60)))
            .await
            .unwrap();
        assert_eq!(cache.get("key1").await, Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_set_overwrites_existing_entry() {
        let cache = InMemoryCache::new();
        cache.set("key1", "old", None).await.unwrap();
        cache.set("key1", "new", None).await.unwrap();

        assert_eq!(cache.get("key1").await, Some("new".to_string()));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = InMemoryCache::new();
        cache.set("key1", "value1", None).await.unwrap();
        cache.delete("key1").await.unwrap();
        assert_eq!(cache.get("key1").await, None);

        // Deleting a missing key is a no-op.
        cache.delete("key1").await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_entry_is_evicted_on_get() {
        let (cache, clock) = cache_with_clock();
        cache
            .set("key1", "value1", Some(Duration::from_millis(1)))
            .await
            .unwrap();

        clock.advance(TimeDelta::milliseconds(1));
        assert_eq!(cache.get("key1").await, Some("value1".to_string()));

        clock.advance(TimeDelta::milliseconds(1));
        assert_eq!(cache.stats().await.unwrap().expired, 1);
        assert_eq!(cache.get("key1").await, None);
        assert_eq!(cache.stats().await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_expiry_with_real_clock() {
        let cache = InMemoryCache::new();
        cache
            .set("short", "lived", Some(Duration::from_millis(1)))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(cache.get("short").await, None);
        assert_eq!(cache.stats().await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_default_ttl_applies_when_omitted() {
        let (cache, clock) = cache_with_clock();
        cache.set("key1", "value1", None).await.unwrap();

        clock.advance(TimeDelta::from_std(DEFAULT_TTL).unwrap());
        assert!(cache.exists("key1").await);

        clock.advance(TimeDelta::milliseconds(1));
        assert!(!cache.exists("key1").await);
    }

    #[tokio::test]
    async fn test_delete_pattern_only_removes_matching_keys() {
        let cache = InMemoryCache::new();
        for key in [
            "blog:posts:all",
            "blog:posts:major-arcana",
            "blog:entry:42",
            "tarot:guidelines",
            "api:health",
        ] {
            cache.set(key, "x", None).await.unwrap();
        }

        let removed = cache.delete_pattern("blog:").await.unwrap();

        assert_eq!(removed, 3);
        assert!(!cache.exists("blog:posts:all").await);
        assert!(!cache.exists("blog:entry:42").await);
        assert!(cache.exists("tarot:guidelines").await);
        assert!(cache.exists("api:health").await);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let cache = InMemoryCache::new();
        cache.set("a", "1", None).await.unwrap();
        cache.set("b", "2", None).await.unwrap();

        cache.clear().await.unwrap();
        assert_eq!(cache.stats().await.unwrap().total, 0);

        cache.clear().await.unwrap();
        assert_eq!(cache.stats().await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_stats_count_hits_and_misses() {
        let cache = InMemoryCache::new();
        cache.set("key1", "value1", None).await.unwrap();

        cache.get("key1").await;
        cache.get("key1").await;
        cache.get("key1").await;
        cache.get("missing").await;
        // exists() does not count as a lookup
        cache.exists("missing").await;

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 0.75).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_stats_split_valid_and_expired() {
        let (cache, clock) = cache_with_clock();
        cache
            .set("short", "1", Some(Duration::from_secs(1)))
            .await
            .unwrap();
        cache
            .set("long", "2", Some(Duration::from_secs(60)))
            .await
            .unwrap();

        clock.advance(TimeDelta::seconds(2));

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.valid, 1);
        assert_eq!(stats.expired, 1);
        assert_eq!(stats.hit_rate, 0.0);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let (cache, clock) = cache_with_clock();
        cache
            .set("short", "1", Some(Duration::from_secs(1)))
            .await
            .unwrap();
        cache
            .set("long", "2", Some(Duration::from_secs(60)))
            .await
            .unwrap();

        clock.advance(TimeDelta::seconds(2));

        assert_eq!(cache.purge_expired().await.unwrap(), 1);
        assert_eq!(cache.len().await, 1);
        assert!(cache.exists("long").await);
    }

    #[tokio::test]
    async fn test_health_entry_round_trip() {
        let cache = InMemoryCache::new();
        let payload = r#"{"status":"ok"}"#;

        cache
            .set("api:health", payload, Some(Duration::from_millis(60_000)))
            .await
            .unwrap();
        assert_eq!(cache.get("api:health").await.as_deref(), Some(payload));

        cache.delete("api:health").await.unwrap();
        assert_eq!(cache.get("api:health").await, None);
    }
}
