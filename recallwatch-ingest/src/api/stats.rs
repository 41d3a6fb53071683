//! Recall statistics endpoint

use axum::{extract::State, Json};
use recallwatch_common::cache::ttl;
use recallwatch_common::db::recalls;
use serde::Serialize;
use serde_json::Value;

use super::ApiError;
use crate::AppState;

const STATS_CACHE_KEY: &str = "recalls:stats";

/// Stats response envelope
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: Value,
}

/// GET /api/recalls/stats
///
/// Aggregate counts: total, by source, by classification, and the trailing
/// 30 days. Cached briefly; invalidated wholesale after each ingestion run.
pub async fn recall_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    if let Some(hit) = state.cache.get(STATS_CACHE_KEY).await {
        return Ok(Json(StatsResponse {
            success: true,
            stats: hit,
        }));
    }

    let stats = recalls::recall_stats(&state.db).await?;
    let stats = serde_json::to_value(&stats).map_err(|e| ApiError::Internal(e.to_string()))?;

    state.cache.set(STATS_CACHE_KEY, stats.clone(), ttl::SHORT).await;

    Ok(Json(StatsResponse {
        success: true,
        stats,
    }))
}
