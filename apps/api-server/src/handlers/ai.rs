//! AI interpretation handler - the only route behind the tiered AI quota.

use actix_web::{HttpResponse, web};
use chrono::Utc;

use innerspell_core::domain::{CallerTier, DrawnCard, TarotReading};
use innerspell_core::ports::{AiRateLimiter, Interpreter};
use innerspell_shared::dto::{InterpretRequest, InterpretResponse};

use crate::handlers::tarot::load_guideline;
use crate::middleware::auth::OptionalIdentity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/ai/interpret
///
/// Checks the caller's quota before calling the provider and only counts the
/// request once an interpretation was produced. A failing limiter backend
/// lets the request through.
pub async fn interpret(
    identity: OptionalIdentity,
    state: web::Data<AppState>,
    body: web::Json<InterpretRequest>,
) -> AppResult<HttpResponse> {
    let (caller_id, is_premium) = identity.caller();
    let req = body.into_inner();

    let reading = TarotReading {
        question: req.question,
        spread: req.spread,
        cards: req
            .cards
            .into_iter()
            .map(|c| DrawnCard {
                name: c.name,
                position: c.position,
                reversed: c.reversed,
            })
            .collect(),
    };
    reading.validate()?;

    let decision = match state.ai_limiter.check(&caller_id, is_premium).await {
        Ok(decision) => Some(decision),
        Err(e) => {
            tracing::error!(caller = %caller_id, error = %e, "AI rate limiter unavailable, failing open");
            None
        }
    };

    if let Some(decision) = decision.as_ref().filter(|d| !d.allowed) {
        return Err(AppError::RateLimited {
            message: decision
                .message
                .clone()
                .unwrap_or_else(|| "Too many requests".to_string()),
            reset_time: decision.reset_time,
            retry_after_secs: decision.retry_after(Utc::now()).as_secs().max(1),
        });
    }

    let guideline = load_guideline(&state, &reading.spread).await?;
    let prompt = reading.to_prompt(guideline.as_ref());
    let interpretation = state.interpreter.interpret(&prompt).await?;

    if let Err(e) = state.ai_limiter.record(&caller_id, is_premium).await {
        tracing::error!(caller = %caller_id, error = %e, "Failed to record AI request");
    }

    let tier = decision
        .as_ref()
        .map(|d| d.tier)
        .unwrap_or_else(|| CallerTier::resolve(&caller_id, is_premium));
    let remaining = decision.map(|d| d.remaining.saturating_sub(1)).unwrap_or(0);

    tracing::info!(caller = %caller_id, tier = %tier, remaining, spread = %reading.spread, "Interpretation served");

    Ok(HttpResponse::Ok().json(InterpretResponse {
        interpretation,
        tier: tier.as_str().to_string(),
        remaining,
    }))
}
