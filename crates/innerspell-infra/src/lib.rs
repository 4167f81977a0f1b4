//! # InnerSpell Infrastructure
//!
//! Concrete implementations of the ports defined in `innerspell-core`:
//! caches, AI rate limiters, repositories, token validation and the LLM client.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory only
//! - `auth` - JWT token validation
//! - `throttle` - Per-client request throttling via governor
//! - `redis` - Redis-backed cache and AI rate limiter for multi-instance deployments

pub mod ai;
pub mod cache;
pub mod rate_limit;
pub mod repository;

#[cfg(feature = "auth")]
pub mod auth;

// Re-exports - In-Memory
pub use ai::{HttpInterpreter, HttpInterpreterConfig, UnconfiguredInterpreter};
pub use cache::{CacheNamespace, InMemoryCache};
pub use rate_limit::{AiRateLimitConfig, InMemoryAiRateLimiter};
pub use repository::{InMemoryGuidelineRepository, InMemoryPostRepository};

#[cfg(feature = "auth")]
pub use auth::{JwtConfig, JwtTokenService};

#[cfg(feature = "throttle")]
pub use rate_limit::{RequestThrottle, ThrottleConfig};

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use cache::{RedisCache, RedisConfig};
#[cfg(feature = "redis")]
pub use rate_limit::{RedisAiRateLimiter, RedisRateLimitConfig};
