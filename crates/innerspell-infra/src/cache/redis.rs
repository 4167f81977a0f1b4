//! Redis cache implementation, shared by every API instance.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use innerspell_core::ports::{Cache, CacheError, CacheStats};

use super::memory::DEFAULT_TTL;

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Whether to fall back to the in-memory adapters if Redis is unavailable
    pub fallback_to_memory: bool,
    /// Prefix for every key this service writes
    pub key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            fallback_to_memory: true,
            key_prefix: "innerspell".to_string(),
        }
    }
}

impl RedisConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            connect_timeout: Duration::from_secs(
                std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            fallback_to_memory: std::env::var("REDIS_FALLBACK_TO_MEMORY")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            key_prefix: std::env::var("REDIS_KEY_PREFIX")
                .unwrap_or_else(|_| "innerspell".to_string()),
        }
    }

    /// Open a managed connection, giving up after `connect_timeout`.
    pub(crate) async fn connect(&self) -> Result<ConnectionManager, String> {
        let client = Client::open(self.url.as_str()).map_err(|e| e.to_string())?;

        tokio::time::timeout(self.connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| "Connection timed out".to_string())?
            .map_err(|e| e.to_string())
    }
}

/// Escape glob metacharacters so a literal substring can be used in `SCAN MATCH`.
fn escape_glob(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Redis-backed cache implementation.
///
/// Entries live under `<key_prefix>:cache:` and expire through Redis TTLs, so
/// `purge_expired` has nothing to do. Hit/miss counters are per process.
pub struct RedisCache {
    conn: ConnectionManager,
    namespace: String,
    default_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RedisCache {
    pub async fn new(config: RedisConfig) -> Result<Self, CacheError> {
        let conn = config.connect().await.map_err(CacheError::Connection)?;

        tracing::info!(url = %config.url, "Connected to Redis cache");

        Ok(Self {
            conn,
            namespace: format!("{}:cache:", config.key_prefix),
            default_ttl: DEFAULT_TTL,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    /// Create from environment configuration.
    pub async fn from_env() -> Result<Self, CacheError> {
        Self::new(RedisConfig::from_env()).await
    }

    pub fn with_default_ttl(mut self, default_ttl: Duration) -> Self {
        self.default_ttl = default_ttl;
        self
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    async fn scan_keys(&self, glob: &str) -> Result<Vec<String>, CacheError> {
        let mut conn = self.conn.clone();
        let mut iter: redis::AsyncIter<String> = conn
            .scan_match(glob)
            .await
            .map_err(|e| CacheError::Operation(e.to_string()))?;

        let mut keys = Vec::new();
        while let Some(key) = iter.next_item().await {
            keys.push(key);
        }
        Ok(keys)
    }

    async fn delete_keys(&self, keys: &[String]) -> Result<usize, CacheError> {
        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn.clone();
        let mut removed = 0;
        for chunk in keys.chunks(500) {
            removed += conn
                .del::<_, usize>(chunk)
                .await
                .map_err(|e| CacheError::Operation(e.to_string()))?;
        }
        Ok(removed)
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.conn.clone();
        let value = match conn.get::<_, Option<String>>(self.make_key(key)).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Redis GET failed");
                None
            }
        };

        let counter = if value.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        value
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        // PX keeps sub-second TTLs; Redis rejects 0.
        let ttl_ms = ttl.unwrap_or(self.default_ttl).as_millis().max(1) as u64;

        conn.pset_ex::<_, _, ()>(self.make_key(key), value, ttl_ms)
            .await
            .map_err(|e| CacheError::Operation(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.make_key(key))
            .await
            .map_err(|e| CacheError::Operation(e.to_string()))
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize, CacheError> {
        let glob = format!("{}*{}*", escape_glob(&self.namespace), escape_glob(pattern));
        let keys = self.scan_keys(&glob).await?;
        let removed = self.delete_keys(&keys).await?;

        tracing::debug!(pattern = %pattern, removed, "Cache entries invalidated");
        Ok(removed)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let glob = format!("{}*", escape_glob(&self.namespace));
        let keys = self.scan_keys(&glob).await?;
        self.delete_keys(&keys).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> bool {
        let mut conn = self.conn.clone();
        conn.exists::<_, bool>(self.make_key(key))
            .await
            .unwrap_or(false)
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        let glob = format!("{}*", escape_glob(&self.namespace));
        let total = self.scan_keys(&glob).await?.len();

        Ok(CacheStats::new(
            total,
            0,
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        ))
    }

    async fn purge_expired(&self) -> Result<usize, CacheError> {
        Ok(0)
    }
}
