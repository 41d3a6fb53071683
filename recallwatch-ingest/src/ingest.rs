//! Aggregation orchestrator
//!
//! Fans out to the three source adapters concurrently, feeds each source's
//! batch through normalization and the deduplicating store writer, and
//! merges the per-source outcomes into one run report. A single source
//! going down never blocks ingestion from the others.

use crate::normalize::{normalize_cpsc, normalize_fda, normalize_usda};
use crate::sources::{CpscClient, FdaClient, UsdaClient};
use recallwatch_common::db::{recalls, Recall, Source};
use recallwatch_common::{QueryCache, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Outcome of one source within an ingestion run.
///
/// `count` of zero with `success` true means the source genuinely had
/// nothing new; `success` false carries the error for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct SourceOutcome {
    pub count: u32,
    pub success: bool,
    pub error: Option<String>,
}

impl SourceOutcome {
    fn failed(error: String) -> Self {
        Self {
            count: 0,
            success: false,
            error: Some(error),
        }
    }
}

/// Report for one fetch-normalize-store run across all sources
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub fda: SourceOutcome,
    pub usda: SourceOutcome,
    pub cpsc: SourceOutcome,
    pub total: u32,
    pub duration_ms: u64,
}

/// Runs ingestion across all sources against an injected store and cache
pub struct Ingestor {
    db: SqlitePool,
    cache: Arc<QueryCache>,
    fda: FdaClient,
    usda: UsdaClient,
    cpsc: CpscClient,
}

impl Ingestor {
    pub fn new(db: SqlitePool, cache: Arc<QueryCache>) -> Result<Self> {
        Ok(Self {
            db,
            cache,
            fda: FdaClient::new()?,
            usda: UsdaClient::new()?,
            cpsc: CpscClient::new()?,
        })
    }

    /// Construct with explicit clients (tests point these at fixture servers)
    pub fn with_clients(
        db: SqlitePool,
        cache: Arc<QueryCache>,
        fda: FdaClient,
        usda: UsdaClient,
        cpsc: CpscClient,
    ) -> Self {
        Self {
            db,
            cache,
            fda,
            usda,
            cpsc,
        }
    }

    /// Run one full ingestion pass over the given lookback window.
    ///
    /// The three fetches run concurrently; each source's records are then
    /// normalized and upserted independently. After the run the query cache
    /// is invalidated in full so readers observe fresh data.
    pub async fn run(&self, window_days: u32, limit: u32) -> RunReport {
        info!(window_days, limit, "Starting ingestion run");
        let started = Instant::now();

        let (fda_result, usda_result, cpsc_result) = tokio::join!(
            self.fda.fetch(window_days, limit),
            self.usda.fetch(window_days, limit),
            self.cpsc.fetch(window_days, limit),
        );

        let fda = match fda_result {
            Ok(records) => {
                let normalized = records.into_iter().map(normalize_fda);
                self.store_batch(Source::Fda, normalized).await
            }
            Err(err) => {
                error!(source = "FDA", error = %err, "Source fetch failed");
                SourceOutcome::failed(err.to_string())
            }
        };

        let usda = match usda_result {
            Ok(records) => {
                let normalized = records.into_iter().map(normalize_usda);
                self.store_batch(Source::Usda, normalized).await
            }
            Err(err) => {
                error!(source = "USDA", error = %err, "Source fetch failed");
                SourceOutcome::failed(err.to_string())
            }
        };

        let cpsc = match cpsc_result {
            Ok(records) => {
                let normalized = records.into_iter().map(normalize_cpsc);
                self.store_batch(Source::Cpsc, normalized).await
            }
            Err(err) => {
                error!(source = "CPSC", error = %err, "Source fetch failed");
                SourceOutcome::failed(err.to_string())
            }
        };

        // Coarse invalidation: every cached query result may now be stale
        self.cache.invalidate_all().await;

        let total = fda.count + usda.count + cpsc.count;
        let duration_ms = started.elapsed().as_millis() as u64;

        info!(
            total,
            fda = fda.count,
            usda = usda.count,
            cpsc = cpsc.count,
            duration_ms,
            "Ingestion run complete"
        );

        RunReport {
            fda,
            usda,
            cpsc,
            total,
            duration_ms,
        }
    }

    /// Upsert one source's normalized batch.
    ///
    /// A failing record is logged and skipped; it never aborts the batch.
    /// If every write in a non-empty batch fails the store itself is
    /// suspect, and the outcome reports the failure instead of a clean
    /// zero-count run.
    async fn store_batch(
        &self,
        source: Source,
        records: impl Iterator<Item = Recall>,
    ) -> SourceOutcome {
        let mut stored: u32 = 0;
        let mut skipped: u32 = 0;
        let mut failed: u32 = 0;
        let mut last_error: Option<String> = None;

        for recall in records {
            if recall.recall_number.trim().is_empty() {
                warn!(source = %source, "Skipping record without a recall number");
                skipped += 1;
                continue;
            }

            match recalls::upsert_recall(&self.db, &recall).await {
                Ok(()) => stored += 1,
                Err(err) => {
                    warn!(
                        source = %source,
                        recall_number = %recall.recall_number,
                        error = %err,
                        "Failed to store recall, skipping"
                    );
                    last_error = Some(err.to_string());
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            warn!(source = %source, stored, skipped, failed, "Batch stored with failures");
        }

        if stored == 0 && failed > 0 {
            return SourceOutcome::failed(format!(
                "All {} store writes failed, last error: {}",
                failed,
                last_error.unwrap_or_else(|| "unknown".to_string())
            ));
        }

        SourceOutcome {
            count: stored,
            success: true,
            error: None,
        }
    }
}
