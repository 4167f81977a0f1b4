//! Per-client request throttle using governor's keyed GCRA limiter.
//!
//! This guards the HTTP surface as a whole and is unrelated to the AI quota.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

use innerspell_core::ports::RateLimitError;

/// Throttle configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Sustained requests per second per client.
    pub per_second: u32,
    /// Requests a client may burst above the sustained rate.
    pub burst: u32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            per_second: 20,
            burst: 40,
        }
    }
}

impl ThrottleConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            per_second: std::env::var("THROTTLE_PER_SECOND")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.per_second),
            burst: std::env::var("THROTTLE_BURST")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.burst),
        }
    }
}

pub struct RequestThrottle {
    limiter: DefaultKeyedRateLimiter<String>,
    clock: DefaultClock,
}

impl RequestThrottle {
    pub fn new(config: &ThrottleConfig) -> Result<Self, RateLimitError> {
        let per_second = NonZeroU32::new(config.per_second).ok_or_else(|| {
            RateLimitError::InvalidConfig("throttle rate must be greater than zero".to_string())
        })?;
        let burst = NonZeroU32::new(config.burst).ok_or_else(|| {
            RateLimitError::InvalidConfig("throttle burst must be greater than zero".to_string())
        })?;

        let quota = Quota::per_second(per_second).allow_burst(burst);

        Ok(Self {
            limiter: RateLimiter::keyed(quota),
            clock: DefaultClock::default(),
        })
    }

    pub fn from_env() -> Result<Self, RateLimitError> {
        Self::new(&ThrottleConfig::from_env())
    }

    /// Admit one request from `client`, or say how long it must wait.
    pub fn check(&self, client: &str) -> Result<(), Duration> {
        self.limiter
            .check_key(&client.to_string())
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }

    /// Drop state for clients that are back at full burst capacity.
    pub fn retain_recent(&self) -> usize {
        let before = self.limiter.len();
        self.limiter.retain_recent();
        before.saturating_sub(self.limiter.len())
    }

    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }
}
