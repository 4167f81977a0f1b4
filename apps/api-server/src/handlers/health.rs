//! Health check endpoint.

use actix_web::{HttpResponse, web};
use chrono::Utc;

use innerspell_core::ports::Cache;
use innerspell_shared::dto::HealthResponse;

use crate::middleware::error::AppResult;
use crate::state::AppState;

/// Health check endpoint - returns server status.
///
/// GET /api/health
pub async fn health_check(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    if let Some(cached) = state.caches.health.get("").await {
        return Ok(HttpResponse::Ok().json(cached));
    }

    let stats = state.cache.stats().await?;
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        cache_entries: stats.valid,
    };

    if let Err(e) = state.caches.health.set("", &response, None).await {
        tracing::warn!(error = %e, "Failed to cache health snapshot");
    }

    Ok(HttpResponse::Ok().json(response))
}
