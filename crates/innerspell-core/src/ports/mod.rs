//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod cache;
mod interpreter;
mod rate_limit;
mod repository;

pub use auth::{AuthError, ROLE_ADMIN, ROLE_PREMIUM, TokenClaims, TokenService};
pub use cache::{Cache, CacheError, CacheStats};
pub use interpreter::{InterpretError, Interpreter};
pub use rate_limit::{AiRateLimiter, RateLimitDecision, RateLimitError};
pub use repository::{BaseRepository, GuidelineRepository, PostRepository};
