//! Periodic sweep of expired cache entries and stale quota state.

use innerspell_core::ports::{AiRateLimiter, Cache};

use crate::state::AppState;

/// Counts removed by one sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub cache_entries: usize,
    pub rate_limit_records: usize,
    pub throttle_keys: usize,
}

/// Run one sweep. Backend failures are logged and do not stop the other steps.
pub async fn sweep_once(state: &AppState) -> SweepReport {
    let cache_entries = state.cache.purge_expired().await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Cache sweep failed");
        0
    });

    let rate_limit_records = state.ai_limiter.sweep().await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "AI rate limiter sweep failed");
        0
    });

    let throttle_keys = state.throttle.retain_recent();

    let report = SweepReport {
        cache_entries,
        rate_limit_records,
        throttle_keys,
    };
    tracing::debug!(
        cache_entries,
        rate_limit_records,
        throttle_keys,
        "Sweep finished"
    );
    report
}
