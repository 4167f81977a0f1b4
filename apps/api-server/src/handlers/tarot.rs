//! Tarot guideline handlers.

use actix_web::{HttpResponse, web};

use innerspell_core::domain::TarotGuideline;
use innerspell_core::ports::{BaseRepository, GuidelineRepository};
use innerspell_shared::ApiResponse;
use innerspell_shared::dto::{GuidelineResponse, UpsertGuidelineRequest};

use crate::middleware::auth::AdminIdentity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const ALL_SUFFIX: &str = "all";

fn guideline_suffix(spread: &str) -> String {
    format!("spread:{}", spread)
}

fn guideline_response(g: TarotGuideline) -> GuidelineResponse {
    GuidelineResponse {
        spread: g.spread,
        title: g.title,
        instructions: g.instructions,
        updated_at: g.updated_at,
    }
}

/// Guideline for `spread`, read through the tarot guideline cache.
pub(crate) async fn load_guideline(
    state: &AppState,
    spread: &str,
) -> AppResult<Option<TarotGuideline>> {
    let suffix = guideline_suffix(spread);
    if let Some(cached) = state.caches.guidelines.get(&suffix).await {
        return Ok(Some(cached));
    }

    let found = state.guidelines.find_by_id(spread.to_string()).await?;
    if let Some(guideline) = &found {
        if let Err(e) = state.caches.guidelines.set(&suffix, guideline, None).await {
            tracing::warn!(error = %e, spread = %spread, "Failed to cache guideline");
        }
    }
    Ok(found)
}

/// GET /api/tarot/guidelines
pub async fn list_guidelines(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let guidelines = match state.caches.guideline_list.get(ALL_SUFFIX).await {
        Some(list) => list,
        None => {
            let list = state.guidelines.list().await?;
            if let Err(e) = state.caches.guideline_list.set(ALL_SUFFIX, &list, None).await {
                tracing::warn!(error = %e, "Failed to cache guideline list");
            }
            list
        }
    };

    let body: Vec<GuidelineResponse> = guidelines.into_iter().map(guideline_response).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::ok(body)))
}

/// PUT /api/tarot/guidelines/{spread} - admin only
pub async fn upsert_guideline(
    admin: AdminIdentity,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpsertGuidelineRequest>,
) -> AppResult<HttpResponse> {
    let spread = path.into_inner();
    let req = body.into_inner();

    if req.instructions.trim().is_empty() {
        return Err(AppError::BadRequest("Instructions must not be empty".to_string()));
    }

    let saved = state
        .guidelines
        .save(TarotGuideline::new(spread, req.title, req.instructions))
        .await?;

    match state.caches.guideline_list.invalidate().await {
        Ok(removed) => tracing::debug!(spread = %saved.spread, removed, "Guideline cache invalidated"),
        Err(e) => tracing::warn!(error = %e, "Failed to invalidate guideline cache"),
    }

    tracing::info!(spread = %saved.spread, by = %admin.0.user_id, "Guideline updated");
    Ok(HttpResponse::Ok().json(ApiResponse::ok(guideline_response(saved))))
}
