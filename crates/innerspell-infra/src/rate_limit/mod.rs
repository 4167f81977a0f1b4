//! Rate limiting implementations - tiered AI quotas and the per-client request throttle.

mod config;
mod memory;

pub use config::AiRateLimitConfig;
pub use memory::InMemoryAiRateLimiter;

#[cfg(feature = "throttle")]
mod throttle;
#[cfg(feature = "throttle")]
pub use throttle::{RequestThrottle, ThrottleConfig};

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::{RedisAiRateLimiter, RedisRateLimitConfig};
