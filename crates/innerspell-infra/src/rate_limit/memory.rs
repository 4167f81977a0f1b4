//! In-memory fixed-window AI rate limiter.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use innerspell_core::domain::CallerTier;
use innerspell_core::ports::{AiRateLimiter, RateLimitDecision, RateLimitError};
use innerspell_core::{Clock, SystemClock};

use super::AiRateLimitConfig;

/// Per-caller counting state.
#[derive(Debug, Clone)]
struct RateLimitRecord {
    window_start: DateTime<Utc>,
    request_count: u32,
    is_premium: bool,
}

impl RateLimitRecord {
    fn new(now: DateTime<Utc>, is_premium: bool) -> Self {
        Self {
            window_start: now,
            request_count: 0,
            is_premium,
        }
    }

    fn window_elapsed(&self, now: DateTime<Utc>, config: &AiRateLimitConfig) -> bool {
        now >= config.window_end(self.window_start)
    }

    /// Start a fresh window at `now` if the current one is over.
    fn roll_window(&mut self, now: DateTime<Utc>, config: &AiRateLimitConfig) {
        if self.window_elapsed(now, config) {
            self.window_start = now;
            self.request_count = 0;
        }
    }
}

/// In-memory AI rate limiter with guest/standard/premium quotas.
///
/// Note: Limits are per-process, not distributed across instances.
pub struct InMemoryAiRateLimiter {
    records: Mutex<HashMap<String, RateLimitRecord>>,
    config: AiRateLimitConfig,
    clock: Arc<dyn Clock>,
}

impl InMemoryAiRateLimiter {
    pub fn new(config: AiRateLimitConfig) -> Result<Self, RateLimitError> {
        config.validate()?;

        Ok(Self {
            records: Mutex::new(HashMap::new()),
            config,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn from_env() -> Result<Self, RateLimitError> {
        Self::new(AiRateLimitConfig::from_env())
    }

    /// Replace the time source (used by tests).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Number of callers currently holding a record.
    pub async fn tracked_callers(&self) -> usize {
        self.records.lock().await.len()
    }
}

#[async_trait]
impl AiRateLimiter for InMemoryAiRateLimiter {
    async fn check(
        &self,
        caller_id: &str,
        is_premium: bool,
    ) -> Result<RateLimitDecision, RateLimitError> {
        let now = self.clock.now();
        let tier = CallerTier::resolve(caller_id, is_premium);
        let limit = self.config.limit_for(tier);

        let mut records = self.records.lock().await;
        let record = records
            .entry(caller_id.to_string())
            .or_insert_with(|| RateLimitRecord::new(now, is_premium));
        record.roll_window(now, &self.config);
        record.is_premium = is_premium;

        let reset_time = self.config.window_end(record.window_start);

        if record.request_count >= limit {
            tracing::warn!(
                caller = %caller_id,
                tier = %tier,
                count = record.request_count,
                limit,
                "AI rate limit exceeded"
            );

            return Ok(RateLimitDecision {
                allowed: false,
                tier,
                limit,
                remaining: 0,
                message: Some(self.config.denial_message(tier, reset_time)),
                reset_time,
            });
        }

        Ok(RateLimitDecision {
            allowed: true,
            tier,
            limit,
            remaining: limit - record.request_count,
            message: None,
            reset_time,
        })
    }

    async fn record(&self, caller_id: &str, is_premium: bool) -> Result<(), RateLimitError> {
        let now = self.clock.now();

        let mut records = self.records.lock().await;
        let record = records
            .entry(caller_id.to_string())
            .or_insert_with(|| RateLimitRecord::new(now, is_premium));
        record.roll_window(now, &self.config);
        record.is_premium = is_premium;
        record.request_count = record.request_count.saturating_add(1);

        tracing::debug!(
            caller = %caller_id,
            count = record.request_count,
            "AI request recorded"
        );
        Ok(())
    }

    async fn sweep(&self) -> Result<usize, RateLimitError> {
        let now = self.clock.now();

        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|_, record| !record.window_elapsed(now, &self.config));
        Ok(before - records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use innerspell_core::ManualClock;
    use std::time::Duration;

    fn limiter() -> (InMemoryAiRateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        let limiter = InMemoryAiRateLimiter::new(AiRateLimitConfig::default())
            .unwrap()
            .with_clock(clock.clone());
        (limiter, clock)
    }

    #[tokio::test]
    async fn test_standard_caller_scenario() {
        let (limiter, clock) = limiter();
        let window_start = clock.now();

        for call in 1..=10 {
            let decision = limiter.check("user-42", false).await.unwrap();
            assert!(decision.allowed, "call {} should be allowed", call);
            assert_eq!(decision.tier, CallerTier::Standard);
            assert_eq!(decision.remaining, 10 - (call - 1));
            limiter.record("user-42", false).await.unwrap();
            clock.advance(TimeDelta::seconds(1));
        }

        let decision = limiter.check("user-42", false).await.unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
        assert!(!decision.message.as_deref().unwrap_or_default().is_empty());
        assert_eq!(
            decision.reset_time,
            window_start + TimeDelta::milliseconds(60_000)
        );
        assert!(decision.reset_time > clock.now());
    }

    #[tokio::test]
    async fn test_denied_check_does_not_count() {
        let (limiter, _clock) = limiter();
        for _ in 0..3 {
            limiter.record("guest", false).await.unwrap();
        }

        for _ in 0..5 {
            assert!(!limiter.check("guest", false).await.unwrap().allowed);
        }

        let records = limiter.records.lock().await;
        assert_eq!(records["guest"].request_count, 3);
    }

    #[tokio::test]
    async fn test_check_alone_never_counts() {
        let (limiter, _clock) = limiter();
        for _ in 0..20 {
            assert!(limiter.check("guest", false).await.unwrap().allowed);
        }
    }

    #[tokio::test]
    async fn test_window_reset_after_reset_time() {
        let (limiter, clock) = limiter();
        for _ in 0..10 {
            limiter.record("user-42", false).await.unwrap();
        }
        let denied = limiter.check("user-42", false).await.unwrap();
        assert!(!denied.allowed);

        clock.set(denied.reset_time);

        let decision = limiter.check("user-42", false).await.unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 10);
        assert_eq!(
            decision.reset_time,
            denied.reset_time + TimeDelta::seconds(60)
        );
    }

    #[tokio::test]
    async fn test_window_reset_with_real_clock() {
        let config = AiRateLimitConfig {
            window: Duration::from_millis(50),
            ..Default::default()
        };
        let limiter = InMemoryAiRateLimiter::new(config).unwrap();

        for _ in 0..3 {
            limiter.record("guest", false).await.unwrap();
        }
        assert!(!limiter.check("guest", false).await.unwrap().allowed);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(limiter.check("guest", false).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_tier_quotas() {
        let (limiter, _clock) = limiter();

        let guest = limiter.check("guest", true).await.unwrap();
        let standard = limiter.check("user-1", false).await.unwrap();
        let premium = limiter.check("user-2", true).await.unwrap();

        assert_eq!(guest.tier, CallerTier::Guest);
        assert!(guest.limit <= standard.limit);
        assert!(premium.limit > standard.limit);
    }

    #[tokio::test]
    async fn test_premium_upgrade_applies_within_window() {
        let (limiter, _clock) = limiter();
        for _ in 0..10 {
            limiter.record("user-7", false).await.unwrap();
        }
        assert!(!limiter.check("user-7", false).await.unwrap().allowed);

        let upgraded = limiter.check("user-7", true).await.unwrap();
        assert!(upgraded.allowed);
        assert_eq!(upgraded.remaining, 40);
    }

    #[tokio::test]
    async fn test_callers_are_independent() {
        let (limiter, _clock) = limiter();
        for _ in 0..3 {
            limiter.record("guest", false).await.unwrap();
        }
        assert!(!limiter.check("guest", false).await.unwrap().allowed);
        assert!(limiter.check("user-1", false).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_sweep_drops_only_elapsed_windows() {
        let (limiter, clock) = limiter();
        limiter.record("old", false).await.unwrap();
        clock.advance(TimeDelta::seconds(30));
        limiter.record("recent", false).await.unwrap();

        clock.advance(TimeDelta::seconds(31));

        assert_eq!(limiter.sweep().await.unwrap(), 1);
        assert_eq!(limiter.tracked_callers().await, 1);
        assert_eq!(
            limiter.check("recent", false).await.unwrap().remaining,
            9
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = AiRateLimitConfig {
            guest_limit: 0,
            ..Default::default()
        };
        assert!(InMemoryAiRateLimiter::new(config).is_err());
    }

    #[test]
    fn test_oversized_window_is_rejected() {
        let config = AiRateLimitConfig {
            window: Duration::from_secs(10_000_000_000_000),
            ..Default::default()
        };
        assert!(InMemoryAiRateLimiter::new(config).is_err());
    }

    #[tokio::test]
    async fn test_window_end_past_max_time_does_not_overflow() {
        let (limiter, clock) = limiter();
        clock.set(DateTime::<Utc>::MAX_UTC - TimeDelta::seconds(10));

        limiter.record("user-42", false).await.unwrap();
        let decision = limiter.check("user-42", false).await.unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 9);
        assert_eq!(decision.reset_time, DateTime::<Utc>::MAX_UTC);
        assert_eq!(limiter.sweep().await.unwrap(), 0);
    }
}
