//! recallwatch-ingest - multi-source recall aggregation service
//!
//! Aggregates government recall data (FDA, USDA, CPSC) into SQLite and
//! serves search/stats endpoints plus authenticated ingestion triggers for
//! a scheduled external caller.

use anyhow::Result;
use clap::Parser;
use recallwatch_common::cache::SWEEP_INTERVAL;
use recallwatch_common::config::{Config, ConfigOverrides};
use recallwatch_common::{db, QueryCache};
use recallwatch_ingest::ingest::Ingestor;
use recallwatch_ingest::{build_router, AppState};
use std::sync::Arc;
use tracing::{info, warn};

/// Command-line options; every flag also resolves from the environment and
/// the TOML config file.
#[derive(Debug, Parser)]
#[command(name = "recallwatch-ingest", version, about = "Multi-source recall ingestion service")]
struct Args {
    /// Data folder holding the SQLite database
    #[arg(long)]
    data_folder: Option<String>,

    /// HTTP listen address (host:port)
    #[arg(long)]
    bind_address: Option<String>,

    /// Bearer secret for the ingestion trigger endpoints
    #[arg(long)]
    ingest_secret: Option<String>,

    /// Default lookback window in days for scheduled runs
    #[arg(long)]
    window_days: Option<u32>,

    /// Maximum records fetched per source per run
    #[arg(long)]
    fetch_limit: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting recallwatch-ingest v{}",
        env!("CARGO_PKG_VERSION")
    );

    let args = Args::parse();
    let overrides = ConfigOverrides {
        data_folder: args.data_folder,
        bind_address: args.bind_address,
        ingest_secret: args.ingest_secret,
        window_days: args.window_days,
        fetch_limit: args.fetch_limit,
    };
    let config = Config::resolve(&overrides)?;

    info!("Database path: {}", config.database_path.display());
    let pool = db::init_database(&config.database_path).await?;

    if config.ingest_secret.is_none() {
        warn!("No ingest secret configured - trigger endpoints are unauthenticated");
    }

    let cache = Arc::new(QueryCache::new());
    let ingestor = Arc::new(Ingestor::new(pool.clone(), cache.clone())?);

    // Periodic sweep bounds cache memory between reads
    let sweeper = cache.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        interval.tick().await; // first tick fires immediately
        loop {
            interval.tick().await;
            sweeper.sweep().await;
        }
    });

    let state = AppState::new(
        pool,
        cache,
        ingestor,
        config.ingest_secret.clone(),
        config.window_days,
        config.fetch_limit,
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("recallwatch-ingest listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
