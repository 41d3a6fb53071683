//! Recall search endpoint
//!
//! Read-through cached: the full serialized filter set keys the cache, so
//! identical queries within the TTL window skip the database entirely.

use axum::{
    extract::{Query, State},
    Json,
};
use recallwatch_common::cache::{ttl, QueryCache};
use recallwatch_common::db::{recalls, Classification, RecallFilters, Source};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::ApiError;
use crate::AppState;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

/// Raw query parameters for GET /api/recalls/search
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub source: Option<String>,
    pub state: Option<String>,
    pub classification: Option<String>,
    pub product_type: Option<String>,
    pub query: Option<String>,
    /// Inclusive lower bound, YYYY-MM-DD
    pub start_date: Option<String>,
    /// Inclusive upper bound, YYYY-MM-DD
    pub end_date: Option<String>,
    /// 1-indexed
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Search response envelope
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub success: bool,
    pub cached: bool,
    #[serde(flatten)]
    pub results: Value,
}

/// Cacheable inner result: everything except the `cached` flag
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchResults {
    recalls: Vec<recallwatch_common::db::RecallRow>,
    total: i64,
    page: i64,
    total_pages: i64,
}

/// GET /api/recalls/search?source=FDA&state=CA&classification=Class+I&query=salmonella&page=1&limit=50
pub async fn search_recalls(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let (filters, page, limit) = build_filters(&params)?;

    let cache_key = QueryCache::key_for("recalls:search", &filters);
    if let Some(hit) = state.cache.get(&cache_key).await {
        debug!("Returning cached recall search results");
        return Ok(Json(SearchResponse {
            success: true,
            cached: true,
            results: hit,
        }));
    }

    let db_page = recalls::search_recalls(&state.db, &filters).await?;

    let results = SearchResults {
        total_pages: total_pages(db_page.total, limit),
        recalls: db_page.recalls,
        total: db_page.total,
        page,
    };
    let results = serde_json::to_value(&results)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    state.cache.set(&cache_key, results.clone(), ttl::MEDIUM).await;

    Ok(Json(SearchResponse {
        success: true,
        cached: false,
        results,
    }))
}

/// Validate raw query parameters into a typed filter set plus pagination
fn build_filters(params: &SearchParams) -> Result<(RecallFilters, i64, i64), ApiError> {
    let source = params
        .source
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.parse::<Source>()
                .map_err(|e| ApiError::BadRequest(e.to_string()))
        })
        .transpose()?;

    let classification = params
        .classification
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| match Classification::parse_exact(s) {
            Classification::Unknown => Err(ApiError::BadRequest(format!(
                "Invalid classification: {}",
                s
            ))),
            parsed => Ok(parsed),
        })
        .transpose()?;

    let start_date = parse_date_param(params.start_date.as_deref(), "startDate")?;
    let end_date = parse_date_param(params.end_date.as_deref(), "endDate")?;

    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let page = params.page.unwrap_or(1).max(1);
    let offset = (page - 1) * limit;

    let filters = RecallFilters {
        source,
        state: params.state.clone().filter(|s| !s.trim().is_empty()),
        classification,
        product_type: params.product_type.clone().filter(|s| !s.trim().is_empty()),
        query: params.query.clone().filter(|s| !s.trim().is_empty()),
        start_date,
        end_date,
        limit,
        offset,
    };

    Ok((filters, page, limit))
}

fn parse_date_param(
    value: Option<&str>,
    name: &str,
) -> Result<Option<chrono::NaiveDate>, ApiError> {
    value
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            chrono::NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
                ApiError::BadRequest(format!("Invalid {} (expected YYYY-MM-DD): {}", name, s))
            })
        })
        .transpose()
}

/// Ceiling division: total pages for a result set
pub fn total_pages(total: i64, limit: i64) -> i64 {
    if limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}
