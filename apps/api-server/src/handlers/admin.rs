//! Admin cache endpoints.

use actix_web::{HttpResponse, web};

use innerspell_core::ports::Cache;
use innerspell_shared::ApiResponse;
use innerspell_shared::dto::{CacheStatsResponse, InvalidateCacheRequest, InvalidateCacheResponse};

use crate::middleware::auth::AdminIdentity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/admin/cache/stats
pub async fn cache_stats(_admin: AdminIdentity, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let stats = state.cache.stats().await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(CacheStatsResponse {
        total: stats.total,
        valid: stats.valid,
        expired: stats.expired,
        hits: stats.hits,
        misses: stats.misses,
        hit_rate: stats.hit_rate,
    })))
}

/// POST /api/admin/cache/invalidate
///
/// An empty or missing pattern clears the whole cache.
pub async fn invalidate_cache(
    admin: AdminIdentity,
    state: web::Data<AppState>,
    body: Option<web::Json<InvalidateCacheRequest>>,
) -> AppResult<HttpResponse> {
    let pattern = body
        .and_then(|b| b.into_inner().pattern)
        .filter(|p| !p.is_empty());

    let removed = match pattern.as_deref() {
        Some(pattern) => state.cache.delete_pattern(pattern).await?,
        None => {
            let total = state.cache.stats().await?.total;
            state.cache.clear().await?;
            total
        }
    };

    tracing::info!(pattern = ?pattern, removed, by = %admin.0.user_id, "Cache invalidated by admin");
    Ok(HttpResponse::Ok().json(ApiResponse::ok(InvalidateCacheResponse { pattern, removed })))
}
