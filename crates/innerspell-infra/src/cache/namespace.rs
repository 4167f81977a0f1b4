//! Typed, prefix-scoped views over a [`Cache`].
//!
//! Each namespace hard-codes its key prefix and default TTL and stores
//! payloads as JSON, so handlers deal in domain types rather than strings.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use innerspell_core::ports::{Cache, CacheError};

/// Key prefix and default TTL of a namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceSpec {
    pub prefix: &'static str,
    pub default_ttl: Duration,
}

/// Published post lists, keyed by category filter.
pub const BLOG_POSTS: NamespaceSpec = NamespaceSpec {
    prefix: "blog:posts",
    default_ttl: Duration::from_secs(5 * 60),
};

/// Single posts, keyed by id.
pub const BLOG_ENTRY: NamespaceSpec = NamespaceSpec {
    prefix: "blog:entry",
    default_ttl: Duration::from_secs(5 * 60),
};

/// Interpretation guidelines, keyed by spread (or `all`).
pub const TAROT_GUIDELINES: NamespaceSpec = NamespaceSpec {
    prefix: "tarot:guidelines",
    default_ttl: Duration::from_secs(30 * 60),
};

/// Health snapshot, single key.
pub const HEALTH: NamespaceSpec = NamespaceSpec {
    prefix: "api:health",
    default_ttl: Duration::from_secs(60),
};

/// Prefix shared by every blog namespace.
pub const BLOG_PATTERN: &str = "blog:";

pub struct CacheNamespace<T> {
    cache: Arc<dyn Cache>,
    spec: NamespaceSpec,
    _payload: PhantomData<fn() -> T>,
}

impl<T> Clone for CacheNamespace<T> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            spec: self.spec,
            _payload: PhantomData,
        }
    }
}

impl<T> CacheNamespace<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(cache: Arc<dyn Cache>, spec: NamespaceSpec) -> Self {
        Self {
            cache,
            spec,
            _payload: PhantomData,
        }
    }

    /// Full cache key: the bare prefix for an empty suffix, `prefix:suffix` otherwise.
    pub fn key(&self, suffix: &str) -> String {
        if suffix.is_empty() {
            self.spec.prefix.to_string()
        } else {
            format!("{}:{}", self.spec.prefix, suffix)
        }
    }

    pub async fn get(&self, suffix: &str) -> Option<T> {
        let key = self.key(suffix);
        let raw = self.cache.get(&key).await?;

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Dropping undecodable cache entry");
                if let Err(e) = self.cache.delete(&key).await {
                    tracing::warn!(key = %key, error = %e, "Failed to drop cache entry");
                }
                None
            }
        }
    }

    /// Store `data`, using the namespace TTL unless `ttl_override` is given.
    pub async fn set(
        &self,
        suffix: &str,
        data: &T,
        ttl_override: Option<Duration>,
    ) -> Result<(), CacheError> {
        let raw =
            serde_json::to_string(data).map_err(|e| CacheError::Serialization(e.to_string()))?;
        let ttl = ttl_override.unwrap_or(self.spec.default_ttl);
        self.cache.set(&self.key(suffix), &raw, Some(ttl)).await
    }

    /// Drop every entry of this namespace.
    pub async fn invalidate(&self) -> Result<usize, CacheError> {
        self.cache.delete_pattern(self.spec.prefix).await
    }

    /// Drop a single entry, leaving the rest of the namespace in place.
    pub async fn invalidate_key(&self, suffix: &str) -> Result<(), CacheError> {
        self.cache.delete(&self.key(suffix)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use chrono::TimeDelta;
    use innerspell_core::ManualClock;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Health {
        status: String,
    }

    fn health_namespace() -> (CacheNamespace<Health>, Arc<dyn Cache>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new().with_clock(clock.clone()));
        (CacheNamespace::new(cache.clone(), HEALTH), cache, clock)
    }

    #[test]
    fn test_key_layout() {
        let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new());
        let posts = CacheNamespace::<Vec<String>>::new(cache.clone(), BLOG_POSTS);
        let health = CacheNamespace::<Health>::new(cache, HEALTH);

        assert_eq!(posts.key("all"), "blog:posts:all");
        assert_eq!(health.key(""), "api:health");
    }

    #[test]
    fn test_preset_ttls() {
        assert_eq!(TAROT_GUIDELINES.default_ttl, Duration::from_secs(1800));
        assert_eq!(BLOG_POSTS.default_ttl, Duration::from_secs(300));
        assert_eq!(HEALTH.default_ttl, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_round_trip_uses_namespace_ttl() {
        let (health, _cache, clock) = health_namespace();
        let value = Health {
            status: "ok".to_string(),
        };

        health.set("", &value, None).await.unwrap();
        assert_eq!(health.get("").await, Some(value));

        clock.advance(TimeDelta::seconds(61));
        assert_eq!(health.get("").await, None);
    }

    #[tokio::test]
    async fn test_ttl_override() {
        let (health, _cache, clock) = health_namespace();
        let value = Health {
            status: "ok".to_string(),
        };

        health
            .set("", &value, Some(Duration::from_secs(600)))
            .await
            .unwrap();
        clock.advance(TimeDelta::seconds(120));
        assert_eq!(health.get("").await, Some(value));
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_dropped() {
        let (health, cache, _clock) = health_namespace();
        cache.set("api:health", "not json", None).await.unwrap();

        assert_eq!(health.get("").await, None);
        assert!(!cache.exists("api:health").await);
    }

    #[tokio::test]
    async fn test_blog_invalidation_leaves_other_namespaces() {
        let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new());
        let posts = CacheNamespace::<Vec<String>>::new(cache.clone(), BLOG_POSTS);
        let entry = CacheNamespace::<String>::new(cache.clone(), BLOG_ENTRY);
        let guidelines = CacheNamespace::<Vec<String>>::new(cache.clone(), TAROT_GUIDELINES);

        posts.set("all", &vec!["a".to_string()], None).await.unwrap();
        posts.set("tarot-basics", &vec![], None).await.unwrap();
        entry.set("42", &"a".to_string(), None).await.unwrap();
        guidelines.set("all", &vec![], None).await.unwrap();

        assert_eq!(cache.delete_pattern(BLOG_PATTERN).await.unwrap(), 3);
        assert_eq!(guidelines.get("all").await, Some(vec![]));

        assert_eq!(guidelines.invalidate().await.unwrap(), 1);
        assert_eq!(guidelines.get("all").await, None);
    }

    #[tokio::test]
    async fn test_invalidate_key_drops_one_entry() {
        let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new());
        let entry = CacheNamespace::<String>::new(cache.clone(), BLOG_ENTRY);

        entry.set("42", &"a".to_string(), None).await.unwrap();
        entry.set("43", &"b".to_string(), None).await.unwrap();

        entry.invalidate_key("42").await.unwrap();
        assert!(!cache.exists("blog:entry:42").await);
        assert_eq!(entry.get("43").await, Some("b".to_string()));

        // Missing keys are not an error
        entry.invalidate_key("42").await.unwrap();
    }
}
