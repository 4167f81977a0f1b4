//! Tiered quota configuration for AI requests.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use innerspell_core::domain::CallerTier;
use innerspell_core::ports::RateLimitError;

/// Longest accepted window.
pub const MAX_WINDOW: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// AI request quota per tier, counted over a fixed window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiRateLimitConfig {
    /// Window duration.
    pub window: Duration,
    /// Requests per window for the `guest` caller.
    pub guest_limit: u32,
    /// Requests per window for signed-in callers.
    pub standard_limit: u32,
    /// Requests per window for premium callers.
    pub premium_limit: u32,
}

impl Default for AiRateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            guest_limit: 3,
            standard_limit: 10,
            premium_limit: 50,
        }
    }
}

impl AiRateLimitConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let parse = |name: &str, default: u32| {
            std::env::var(name)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default)
        };

        Self {
            window: Duration::from_secs(
                std::env::var("AI_RATE_LIMIT_WINDOW_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.window.as_secs()),
            ),
            guest_limit: parse("AI_RATE_LIMIT_GUEST", defaults.guest_limit),
            standard_limit: parse("AI_RATE_LIMIT_STANDARD", defaults.standard_limit),
            premium_limit: parse("AI_RATE_LIMIT_PREMIUM", defaults.premium_limit),
        }
    }

    /// Enforce `0 < guest <= standard < premium` and `0 < window <= MAX_WINDOW`.
    pub fn validate(&self) -> Result<(), RateLimitError> {
        if self.window.is_zero() {
            return Err(RateLimitError::InvalidConfig(
                "window must be greater than zero".to_string(),
            ));
        }
        if self.window > MAX_WINDOW {
            return Err(RateLimitError::InvalidConfig(format!(
                "window of {}s exceeds the maximum of {}s",
                self.window.as_secs(),
                MAX_WINDOW.as_secs()
            )));
        }
        if self.guest_limit == 0 {
            return Err(RateLimitError::InvalidConfig(
                "guest limit must be greater than zero".to_string(),
            ));
        }
        if self.guest_limit > self.standard_limit {
            return Err(RateLimitError::InvalidConfig(format!(
                "guest limit ({}) exceeds standard limit ({})",
                self.guest_limit, self.standard_limit
            )));
        }
        if self.premium_limit <= self.standard_limit {
            return Err(RateLimitError::InvalidConfig(format!(
                "premium limit ({}) must exceed standard limit ({})",
                self.premium_limit, self.standard_limit
            )));
        }
        Ok(())
    }

    pub fn limit_for(&self, tier: CallerTier) -> u32 {
        match tier {
            CallerTier::Guest => self.guest_limit,
            CallerTier::Standard => self.standard_limit,
            CallerTier::Premium => self.premium_limit,
        }
    }

    /// Window as a chrono delta. Only valid after `validate`.
    pub(crate) fn window_delta(&self) -> TimeDelta {
        TimeDelta::from_std(self.window).unwrap_or(TimeDelta::MAX)
    }

    /// End of a window opened at `start`, saturating at the largest representable time.
    pub(crate) fn window_end(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        start
            .checked_add_signed(self.window_delta())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Message shown to a caller who has used up their quota.
    pub fn denial_message(&self, tier: CallerTier, reset_time: DateTime<Utc>) -> String {
        let hint = match tier {
            CallerTier::Guest => " Sign in for a higher limit.",
            CallerTier::Standard => " Premium members get more readings.",
            CallerTier::Premium => "",
        };

        format!(
            "AI interpretation limit reached ({} requests per {} for {} callers). Try again after {}.{}",
            self.limit_for(tier),
            describe_window(self.window),
            tier,
            reset_time.format("%H:%M:%S UTC"),
            hint
        )
    }
}

fn describe_window(window: Duration) -> String {
    if window.subsec_millis() != 0 || window.as_secs() == 0 {
        let ms = window.as_millis().max(1);
        return if ms == 1 {
            "millisecond".to_string()
        } else {
            format!("{} milliseconds", ms)
        };
    }

    let secs = window.as_secs();
    match secs {
        3600 => "hour".to_string(),
        60 => "minute".to_string(),
        1 => "second".to_string(),
        s if s % 3600 == 0 => format!("{} hours", s / 3600),
        s if s % 60 == 0 => format!("{} minutes", s / 60),
        s => format!("{} seconds", s),
    }
}
