use async_trait::async_trait;
use std::time::Duration;

/// Cache trait - abstraction over caching backends (Redis, in-memory).
///
/// Values are opaque strings; typed payloads go through a namespaced wrapper.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Get a live value. Counts as a hit or a miss.
    async fn get(&self, key: &str) -> Option<String>;

    /// Set a value. `None` uses the backend's default TTL.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError>;

    /// Delete a key from the cache.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Delete every key containing `pattern` as a substring.
    async fn delete_pattern(&self, pattern: &str) -> Result<usize, CacheError>;

    /// Remove all entries.
    async fn clear(&self) -> Result<(), CacheError>;

    /// Check if a live key exists without affecting hit statistics.
    async fn exists(&self, key: &str) -> bool;

    /// Snapshot of entry counts and lookup statistics.
    async fn stats(&self) -> Result<CacheStats, CacheError>;

    /// Drop every expired entry, returning how many were removed.
    async fn purge_expired(&self) -> Result<usize, CacheError>;
}

/// Cache statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    pub total: usize,
    pub valid: usize,
    pub expired: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

impl CacheStats {
    pub fn new(total: usize, expired: usize, hits: u64, misses: u64) -> Self {
        let lookups = hits + misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            hits as f64 / lookups as f64
        };

        Self {
            total,
            valid: total.saturating_sub(expired),
            expired,
            hits,
            misses,
            hit_rate,
        }
    }
}

/// Cache operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_is_zero_without_lookups() {
        let stats = CacheStats::new(3, 1, 0, 0);
        assert_eq!(stats.hit_rate, 0.0);
        assert_eq!(stats.valid, 2);
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats::new(0, 0, 3, 1);
        assert!((stats.hit_rate - 0.75).abs() < f64::EPSILON);
    }
}
