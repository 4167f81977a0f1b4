//! AI request rate limiting port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::domain::CallerTier;

/// Per-caller quota for AI interpretation requests.
///
/// `check` decides without counting; `record` counts one consumed request and
/// must be called exactly once per allowed request that succeeded downstream.
#[async_trait]
pub trait AiRateLimiter: Send + Sync {
    /// Decide whether `caller_id` may make another request in its current window.
    async fn check(
        &self,
        caller_id: &str,
        is_premium: bool,
    ) -> Result<RateLimitDecision, RateLimitError>;

    /// Count one successful request against `caller_id`.
    async fn record(&self, caller_id: &str, is_premium: bool) -> Result<(), RateLimitError>;

    /// Forget callers whose window has elapsed. Returns how many were dropped.
    async fn sweep(&self) -> Result<usize, RateLimitError>;
}

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub tier: CallerTier,
    pub limit: u32,
    pub remaining: u32,
    /// Human-readable explanation, set when denied.
    pub message: Option<String>,
    /// End of the caller's current window.
    pub reset_time: DateTime<Utc>,
}

impl RateLimitDecision {
    /// Time left until `reset_time`, rounded up to whole seconds.
    pub fn retry_after(&self, now: DateTime<Utc>) -> Duration {
        let millis = (self.reset_time - now).num_milliseconds().max(0) as u64;
        Duration::from_secs(millis.div_ceil(1000))
    }
}

/// Rate limit errors.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Invalid rate limit configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_retry_after_rounds_up() {
        let now = Utc::now();
        let decision = RateLimitDecision {
            allowed: false,
            tier: CallerTier::Standard,
            limit: 10,
            remaining: 0,
            message: Some("limited".to_string()),
            reset_time: now + TimeDelta::milliseconds(1200),
        };
        assert_eq!(decision.retry_after(now), Duration::from_secs(2));
        assert_eq!(
            decision.retry_after(now + TimeDelta::seconds(5)),
            Duration::ZERO
        );
    }
}
