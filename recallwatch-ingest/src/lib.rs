//! recallwatch-ingest library - recall aggregation service
//!
//! Fetches recall records from the FDA, USDA, and CPSC APIs, normalizes
//! them into one canonical shape, deduplicates them into SQLite, and serves
//! search/stats over HTTP with a TTL-bounded query cache.

use axum::Router;
use recallwatch_common::QueryCache;
use sqlx::SqlitePool;
use std::sync::Arc;

pub mod api;
pub mod ingest;
pub mod normalize;
pub mod sources;

use ingest::Ingestor;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Query result cache, invalidated after every ingestion run
    pub cache: Arc<QueryCache>,
    /// Orchestrator for fetch-normalize-store runs
    pub ingestor: Arc<Ingestor>,
    /// Bearer secret for the trigger endpoints; `None` disables auth
    pub ingest_secret: Option<String>,
    /// Default lookback window for scheduled runs
    pub window_days: u32,
    /// Per-source fetch limit
    pub fetch_limit: u32,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        cache: Arc<QueryCache>,
        ingestor: Arc<Ingestor>,
        ingest_secret: Option<String>,
        window_days: u32,
        fetch_limit: u32,
    ) -> Self {
        Self {
            db,
            cache,
            ingestor,
            ingest_secret,
            window_days,
            fetch_limit,
        }
    }
}

/// Build application router
///
/// Ingestion triggers require bearer authentication; health and the read
/// endpoints are public.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::get;
    use tower_http::trace::TraceLayer;

    // Protected routes (require authentication)
    let protected = Router::new()
        .route("/api/recalls/update", get(api::update_recalls))
        .route("/api/cron/update-recalls", get(api::cron_update_recalls))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // Public routes (no authentication)
    let public = Router::new()
        .route("/api/recalls/search", get(api::search_recalls))
        .route("/api/recalls/stats", get(api::recall_stats))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
