//! Recall persistence: deduplicating upserts, filtered search, and stats
//!
//! The upsert is keyed by `recall_number`, so repeated ingestion runs are
//! idempotent. `source` and `created_at` are never touched by the conflict
//! clause: a record's provenance is fixed at creation.

use crate::db::models::{
    Classification, Recall, RecallFilters, RecallRow, RecallStats, SearchPage, Source,
};
use crate::Result;
use chrono::{Duration, NaiveDate, Utc};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::BTreeMap;
use uuid::Uuid;

const RECALL_COLUMNS: &str = "recall_number, source, title, product_description, \
     reason_for_recall, company_name, classification, distribution_pattern, state, \
     recall_initiation_date, report_date, product_type, hazard, status, image_url, \
     source_url, created_at, updated_at";

/// Insert or update a recall, keyed by its recall number.
///
/// Atomic per record: concurrent readers never observe a partially-written
/// row. Overwrites all mutable fields wholesale and bumps `updated_at`.
pub async fn upsert_recall(pool: &SqlitePool, recall: &Recall) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO recalls (
            guid, recall_number, source, title, product_description,
            reason_for_recall, company_name, classification, distribution_pattern,
            state, recall_initiation_date, report_date, product_type, hazard,
            status, image_url, source_url, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(recall_number) DO UPDATE SET
            title = excluded.title,
            product_description = excluded.product_description,
            reason_for_recall = excluded.reason_for_recall,
            company_name = excluded.company_name,
            classification = excluded.classification,
            distribution_pattern = excluded.distribution_pattern,
            state = excluded.state,
            recall_initiation_date = excluded.recall_initiation_date,
            report_date = excluded.report_date,
            product_type = excluded.product_type,
            hazard = excluded.hazard,
            status = excluded.status,
            image_url = excluded.image_url,
            source_url = excluded.source_url,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&recall.recall_number)
    .bind(recall.source.as_str())
    .bind(&recall.title)
    .bind(&recall.product_description)
    .bind(&recall.reason_for_recall)
    .bind(&recall.company_name)
    .bind(recall.classification.as_str())
    .bind(&recall.distribution_pattern)
    .bind(&recall.state)
    .bind(recall.recall_initiation_date.to_string())
    .bind(recall.report_date.map(|d| d.to_string()))
    .bind(&recall.product_type)
    .bind(&recall.hazard)
    .bind(&recall.status)
    .bind(&recall.image_url)
    .bind(&recall.source_url)
    .execute(pool)
    .await?;

    Ok(())
}

/// Push WHERE clauses for the given filter set onto a query builder.
///
/// Both the count and the page query must see identical conditions, so the
/// logic lives in one place.
fn push_filters(qb: &mut QueryBuilder<Sqlite>, filters: &RecallFilters) {
    qb.push(" WHERE 1=1");

    if let Some(source) = filters.source {
        qb.push(" AND source = ").push_bind(source.as_str());
    }
    if let Some(state) = &filters.state {
        qb.push(" AND state = ").push_bind(state.clone());
    }
    if let Some(classification) = filters.classification {
        qb.push(" AND classification = ").push_bind(classification.as_str());
    }
    if let Some(product_type) = &filters.product_type {
        qb.push(" AND product_type = ").push_bind(product_type.clone());
    }
    if let Some(query) = &filters.query {
        if !query.trim().is_empty() {
            let pattern = format!("%{}%", query.trim());
            qb.push(" AND (title LIKE ")
                .push_bind(pattern.clone())
                .push(" COLLATE NOCASE OR product_description LIKE ")
                .push_bind(pattern.clone())
                .push(" COLLATE NOCASE OR company_name LIKE ")
                .push_bind(pattern.clone())
                .push(" COLLATE NOCASE OR reason_for_recall LIKE ")
                .push_bind(pattern)
                .push(" COLLATE NOCASE)");
        }
    }
    // Dates are stored as ISO YYYY-MM-DD, so lexical comparison is
    // chronological and both bounds are inclusive.
    if let Some(start) = filters.start_date {
        qb.push(" AND recall_initiation_date >= ").push_bind(start.to_string());
    }
    if let Some(end) = filters.end_date {
        qb.push(" AND recall_initiation_date <= ").push_bind(end.to_string());
    }
}

/// Search recalls with the given filters, newest initiation date first
pub async fn search_recalls(pool: &SqlitePool, filters: &RecallFilters) -> Result<SearchPage> {
    let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM recalls");
    push_filters(&mut count_query, filters);
    let total: i64 = count_query.build_query_scalar().fetch_one(pool).await?;

    let mut page_query =
        QueryBuilder::new(format!("SELECT {} FROM recalls", RECALL_COLUMNS));
    push_filters(&mut page_query, filters);
    page_query
        .push(" ORDER BY recall_initiation_date DESC LIMIT ")
        .push_bind(filters.limit.max(1))
        .push(" OFFSET ")
        .push_bind(filters.offset.max(0));

    let rows = page_query.build().fetch_all(pool).await?;
    let recalls = rows
        .iter()
        .map(row_to_recall)
        .collect::<Result<Vec<RecallRow>>>()?;

    Ok(SearchPage { recalls, total })
}

/// Aggregate counts: total, per source, per classification, trailing 30 days
pub async fn recall_stats(pool: &SqlitePool) -> Result<RecallStats> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recalls")
        .fetch_one(pool)
        .await?;

    let by_source: BTreeMap<String, i64> =
        sqlx::query_as::<_, (String, i64)>("SELECT source, COUNT(*) FROM recalls GROUP BY source")
            .fetch_all(pool)
            .await?
            .into_iter()
            .collect();

    let by_classification: BTreeMap<String, i64> = sqlx::query_as::<_, (String, i64)>(
        "SELECT classification, COUNT(*) FROM recalls GROUP BY classification",
    )
    .fetch_all(pool)
    .await?
    .into_iter()
    .collect();

    let cutoff = Utc::now().date_naive() - Duration::days(30);
    let last_30_days: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM recalls WHERE recall_initiation_date >= ?")
            .bind(cutoff.to_string())
            .fetch_one(pool)
            .await?;

    Ok(RecallStats {
        total,
        by_source,
        by_classification,
        last_30_days,
    })
}

/// Total number of persisted recalls (test and diagnostics helper)
pub async fn count_recalls(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM recalls")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Load one recall by its recall number
pub async fn get_recall(pool: &SqlitePool, recall_number: &str) -> Result<Option<RecallRow>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM recalls WHERE recall_number = ?",
        RECALL_COLUMNS
    ))
    .bind(recall_number)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_to_recall).transpose()
}

fn row_to_recall(row: &sqlx::sqlite::SqliteRow) -> Result<RecallRow> {
    let source: String = row.get("source");
    let source: Source = source
        .parse()
        .map_err(|_| crate::Error::Internal(format!("Corrupt source column: {}", source)))?;

    let classification: String = row.get("classification");
    let classification = Classification::parse_exact(&classification);

    let initiation: String = row.get("recall_initiation_date");
    let recall_initiation_date = parse_stored_date(&initiation)?;

    let report_date: Option<String> = row.get("report_date");
    let report_date = report_date.as_deref().map(parse_stored_date).transpose()?;

    Ok(RecallRow {
        recall: Recall {
            recall_number: row.get("recall_number"),
            source,
            title: row.get("title"),
            product_description: row.get("product_description"),
            reason_for_recall: row.get("reason_for_recall"),
            company_name: row.get("company_name"),
            classification,
            distribution_pattern: row.get("distribution_pattern"),
            state: row.get("state"),
            recall_initiation_date,
            report_date,
            product_type: row.get("product_type"),
            hazard: row.get("hazard"),
            status: row.get("status"),
            image_url: row.get("image_url"),
            source_url: row.get("source_url"),
        },
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn parse_stored_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| crate::Error::Internal(format!("Corrupt date column: {}", s)))
}
