//! Cache implementations - in-memory TTL cache, Redis, and typed namespaces.

mod memory;
pub mod namespace;

pub use memory::{DEFAULT_TTL, InMemoryCache};
pub use namespace::{CacheNamespace, NamespaceSpec};

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::{RedisCache, RedisConfig};
