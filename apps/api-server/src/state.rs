//! Application state - shared across all handlers.

use std::sync::Arc;

use innerspell_core::domain::{BlogPost, TarotGuideline};
use innerspell_core::ports::{
    AiRateLimiter, Cache, GuidelineRepository, Interpreter, PostRepository,
};
use innerspell_infra::cache::namespace::{BLOG_ENTRY, BLOG_POSTS, HEALTH, TAROT_GUIDELINES};
use innerspell_infra::{
    CacheNamespace, HttpInterpreter, HttpInterpreterConfig, InMemoryAiRateLimiter, InMemoryCache,
    InMemoryGuidelineRepository, InMemoryPostRepository, RequestThrottle, UnconfiguredInterpreter,
};
use innerspell_shared::dto::HealthResponse;

use crate::config::{AppConfig, StateBackend};

/// Typed views over the shared cache, one per namespace.
#[derive(Clone)]
pub struct Caches {
    pub post_lists: CacheNamespace<Vec<BlogPost>>,
    pub posts: CacheNamespace<BlogPost>,
    pub guideline_list: CacheNamespace<Vec<TarotGuideline>>,
    pub guidelines: CacheNamespace<TarotGuideline>,
    pub health: CacheNamespace<HealthResponse>,
}

impl Caches {
    pub fn new(cache: &Arc<dyn Cache>) -> Self {
        Self {
            post_lists: CacheNamespace::new(cache.clone(), BLOG_POSTS),
            posts: CacheNamespace::new(cache.clone(), BLOG_ENTRY),
            guideline_list: CacheNamespace::new(cache.clone(), TAROT_GUIDELINES),
            guidelines: CacheNamespace::new(cache.clone(), TAROT_GUIDELINES),
            health: CacheNamespace::new(cache.clone(), HEALTH),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<dyn Cache>,
    pub caches: Caches,
    pub ai_limiter: Arc<dyn AiRateLimiter>,
    pub interpreter: Arc<dyn Interpreter>,
    pub posts: Arc<dyn PostRepository>,
    pub guidelines: Arc<dyn GuidelineRepository>,
    pub throttle: Arc<RequestThrottle>,
}

type Backends = (Arc<dyn Cache>, Arc<dyn AiRateLimiter>);

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let (cache, ai_limiter) = match config.state_backend {
            StateBackend::Memory => memory_backends()?,
            StateBackend::Redis => redis_backends().await?,
        };

        let interpreter: Arc<dyn Interpreter> = match HttpInterpreterConfig::from_env() {
            Some(ai_config) => {
                tracing::info!(provider = %ai_config.base_url, model = %ai_config.model, "AI interpreter configured");
                Arc::new(HttpInterpreter::new(ai_config)?)
            }
            None => {
                tracing::warn!("AI_PROVIDER_URL not set. Interpretation requests will return 503.");
                Arc::new(UnconfiguredInterpreter)
            }
        };

        let state = Self::assemble(
            cache,
            ai_limiter,
            interpreter,
            Arc::new(RequestThrottle::from_env()?),
        );

        tracing::info!(backend = ?config.state_backend, "Application state initialized");
        Ok(state)
    }

    /// Wire state around the given adapters, with in-memory repositories.
    pub fn assemble(
        cache: Arc<dyn Cache>,
        ai_limiter: Arc<dyn AiRateLimiter>,
        interpreter: Arc<dyn Interpreter>,
        throttle: Arc<RequestThrottle>,
    ) -> Self {
        Self {
            caches: Caches::new(&cache),
            cache,
            ai_limiter,
            interpreter,
            posts: Arc::new(InMemoryPostRepository::new()),
            guidelines: Arc::new(InMemoryGuidelineRepository::with_defaults()),
            throttle,
        }
    }
}

fn memory_backends() -> anyhow::Result<Backends> {
    let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::from_env());
    let limiter: Arc<dyn AiRateLimiter> = Arc::new(InMemoryAiRateLimiter::from_env()?);
    Ok((cache, limiter))
}

#[cfg(feature = "redis")]
async fn redis_backends() -> anyhow::Result<Backends> {
    use innerspell_infra::{RedisAiRateLimiter, RedisCache, RedisConfig, RedisRateLimitConfig};

    let redis = RedisConfig::from_env();
    let connected = async {
        let cache = RedisCache::from_env().await?;
        let limiter = RedisAiRateLimiter::new(RedisRateLimitConfig::from_env()).await?;
        anyhow::Ok((cache, limiter))
    }
    .await;

    match connected {
        Ok((cache, limiter)) => Ok((Arc::new(cache), Arc::new(limiter))),
        Err(e) if redis.fallback_to_memory => {
            tracing::error!(
                url = %redis.url,
                error = %e,
                "Failed to connect to Redis. Using in-memory fallback."
            );
            memory_backends()
        }
        Err(e) => Err(e.context(format!("connecting to Redis at {}", redis.url))),
    }
}

#[cfg(not(feature = "redis"))]
async fn redis_backends() -> anyhow::Result<Backends> {
    tracing::warn!("STATE_BACKEND=redis but built without the redis feature. Using in-memory state.");
    memory_backends()
}
