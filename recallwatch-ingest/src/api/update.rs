//! Ingestion trigger endpoints
//!
//! Both routes sit behind the bearer-token middleware. The cron route runs
//! the configured daily window; the on-demand route accepts an explicit
//! lookback in days.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::ApiError;
use crate::ingest::RunReport;
use crate::AppState;

/// Query parameters for the on-demand trigger
#[derive(Debug, Deserialize)]
pub struct UpdateParams {
    /// Lookback window in days; defaults to the configured window
    pub days: Option<u32>,
}

/// Ingestion trigger response envelope
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
    pub success: bool,
    pub message: String,
    pub duration: u64,
    pub total_recalls: u32,
    pub results: RunReport,
    pub timestamp: String,
}

/// GET /api/cron/update-recalls
///
/// Scheduled daily entrypoint; uses the configured lookback window.
pub async fn cron_update_recalls(
    State(state): State<AppState>,
) -> Result<Json<UpdateResponse>, ApiError> {
    info!("Cron-triggered recall update starting");
    run_update(state, None).await
}

/// GET /api/recalls/update?days=30
///
/// On-demand entrypoint with a caller-chosen lookback window.
pub async fn update_recalls(
    State(state): State<AppState>,
    Query(params): Query<UpdateParams>,
) -> Result<Json<UpdateResponse>, ApiError> {
    if params.days == Some(0) {
        return Err(ApiError::BadRequest("days must be at least 1".to_string()));
    }
    run_update(state, params.days).await
}

async fn run_update(
    state: AppState,
    days: Option<u32>,
) -> Result<Json<UpdateResponse>, ApiError> {
    let window_days = days.unwrap_or(state.window_days);
    let report = state.ingestor.run(window_days, state.fetch_limit).await;

    Ok(Json(UpdateResponse {
        success: true,
        message: format!("Updated {} recalls", report.total),
        duration: report.duration_ms,
        total_recalls: report.total,
        results: report,
        timestamp: Utc::now().to_rfc3339(),
    }))
}
