//! Redis AI rate limiter - one fixed-window counter per caller, shared by all instances.

use async_trait::async_trait;
use chrono::TimeDelta;
use redis::Script;
use redis::aio::ConnectionManager;

use innerspell_core::domain::CallerTier;
use innerspell_core::ports::{AiRateLimiter, RateLimitDecision, RateLimitError};
use innerspell_core::{Clock, SystemClock};

use super::AiRateLimitConfig;
use crate::cache::RedisConfig;

/// Redis rate limiter configuration.
#[derive(Debug, Clone, Default)]
pub struct RedisRateLimitConfig {
    /// Redis connection config
    pub redis: RedisConfig,
    /// Tier quotas and window
    pub quotas: AiRateLimitConfig,
}

impl RedisRateLimitConfig {
    pub fn from_env() -> Self {
        Self {
            redis: RedisConfig::from_env(),
            quotas: AiRateLimitConfig::from_env(),
        }
    }
}

/// Redis-backed AI rate limiter.
///
/// The counter key expires with the window, so Redis forgets idle callers on
/// its own and `sweep` has nothing to do.
pub struct RedisAiRateLimiter {
    conn: ConnectionManager,
    config: RedisRateLimitConfig,
    /// Atomic increment. A missing counter, or one without an expiry, restarts the window at 1
    record_script: Script,
    clock: Box<dyn Clock>,
}

impl RedisAiRateLimiter {
    pub async fn new(config: RedisRateLimitConfig) -> Result<Self, RateLimitError> {
        config.quotas.validate()?;

        let conn = config
            .redis
            .connect()
            .await
            .map_err(RateLimitError::Backend)?;

        let record_script = Script::new(
            r#"
            if redis.call('PTTL', KEYS[1]) <= 0 then
                redis.call('SET', KEYS[1], 1, 'PX', ARGV[1])
                return 1
            end
            return redis.call('INCR', KEYS[1])
            "#,
        );

        tracing::info!(url = %config.redis.url, "Connected to Redis AI rate limiter");

        Ok(Self {
            conn,
            config,
            record_script,
            clock: Box::new(SystemClock),
        })
    }

    /// Create from environment configuration.
    pub async fn from_env() -> Result<Self, RateLimitError> {
        Self::new(RedisRateLimitConfig::from_env()).await
    }

    fn make_key(&self, caller_id: &str) -> String {
        format!("{}:ai:{}", self.config.redis.key_prefix, caller_id)
    }
}

#[async_trait]
impl AiRateLimiter for RedisAiRateLimiter {
    async fn check(
        &self,
        caller_id: &str,
        is_premium: bool,
    ) -> Result<RateLimitDecision, RateLimitError> {
        let quotas = &self.config.quotas;
        let tier = CallerTier::resolve(caller_id, is_premium);
        let limit = quotas.limit_for(tier);
        let mut conn = self.conn.clone();

        let (count, pttl): (Option<u32>, i64) = redis::pipe()
            .atomic()
            .get(self.make_key(caller_id))
            .pttl(self.make_key(caller_id))
            .query_async(&mut conn)
            .await
            .map_err(|e| RateLimitError::Backend(e.to_string()))?;

        let now = self.clock.now();
        // -2: no counter yet, -1: counter without expiry; both mean a fresh window.
        let (count, reset_time) = if pttl > 0 {
            (count.unwrap_or(0), now + TimeDelta::milliseconds(pttl))
        } else {
            (0, quotas.window_end(now))
        };

        if count >= limit {
            tracing::warn!(caller = %caller_id, tier = %tier, count, limit, "AI rate limit exceeded");

            return Ok(RateLimitDecision {
                allowed: false,
                tier,
                limit,
                remaining: 0,
                message: Some(quotas.denial_message(tier, reset_time)),
                reset_time,
            });
        }

        Ok(RateLimitDecision {
            allowed: true,
            tier,
            limit,
            remaining: limit - count,
            message: None,
            reset_time,
        })
    }

    async fn record(&self, caller_id: &str, _is_premium: bool) -> Result<(), RateLimitError> {
        let mut conn = self.conn.clone();
        let window_ms = (self.config.quotas.window.as_millis() as u64).max(1);

        let count: i64 = self
            .record_script
            .key(self.make_key(caller_id))
            .arg(window_ms)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| RateLimitError::Backend(e.to_string()))?;

        tracing::debug!(caller = %caller_id, count, "AI request recorded");
        Ok(())
    }

    async fn sweep(&self) -> Result<usize, RateLimitError> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn get_test_ratelimiter(window: Duration) -> Option<RedisAiRateLimiter> {
        let config = RedisRateLimitConfig {
            redis: RedisConfig {
                url: std::env::var("REDIS_URL")
                    .unwrap_or_else(|_| "redis://localhost:6389".to_string()),
                connect_timeout: Duration::from_secs(1),
                fallback_to_memory: false,
                key_prefix: format!("test_ratelimit_{}", uuid::Uuid::new_v4()),
            },
            quotas: AiRateLimitConfig {
                window,
                guest_limit: 2,
                standard_limit: 2,
                premium_limit: 4,
            },
        };

        RedisAiRateLimiter::new(config).await.ok()
    }

    #[tokio::test]
    async fn test_redis_ai_ratelimiter() {
        let limiter = match get_test_ratelimiter(Duration::from_secs(1)).await {
            Some(l) => l,
            None => return,
        };

        let caller = "user-1";

        let res = limiter.check(caller, false).await.unwrap();
        assert!(res.allowed);
        assert_eq!(res.remaining, 2);
        limiter.record(caller, false).await.unwrap();

        let res = limiter.check(caller, false).await.unwrap();
        assert!(res.allowed);
        assert_eq!(res.remaining, 1);
        limiter.record(caller, false).await.unwrap();

        // Third request - rejected, and checking again does not count
        let res = limiter.check(caller, false).await.unwrap();
        assert!(!res.allowed);
        assert!(res.message.is_some());
        assert!(!limiter.check(caller, false).await.unwrap().allowed);

        // Premium quota is higher for the same counter
        assert!(limiter.check(caller, true).await.unwrap().allowed);

        // Wait for reset
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let res = limiter.check(caller, false).await.unwrap();
        assert!(res.allowed);
        assert_eq!(res.remaining, 2);
    }

    #[tokio::test]
    async fn test_counter_without_expiry_restarts_window() {
        let window = Duration::from_secs(30);
        let limiter = match get_test_ratelimiter(window).await {
            Some(l) => l,
            None => return,
        };

        let caller = "user-42";
        let key = limiter.make_key(caller);
        let mut conn = limiter.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(&key)
            .arg(5)
            .query_async(&mut conn)
            .await
            .unwrap();

        let before = chrono::Utc::now();
        let res = limiter.check(caller, false).await.unwrap();
        assert!(res.allowed);
        assert_eq!(res.remaining, 2);
        assert!(res.reset_time >= before + TimeDelta::seconds(29));
        assert!(res.reset_time <= chrono::Utc::now() + TimeDelta::seconds(30));

        limiter.record(caller, false).await.unwrap();

        let pttl: i64 = redis::cmd("PTTL")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .unwrap();
        assert!(pttl > 0 && pttl <= 30_000);

        let count: u32 = redis::cmd("GET")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(limiter.check(caller, false).await.unwrap().remaining, 1);
    }
}
