//! Integration tests for the recall store
//!
//! Covers the deduplicating upsert (idempotence, source immutability),
//! filtered search, and aggregate stats against an in-memory database.

use chrono::{Duration, NaiveDate, Utc};
use recallwatch_common::db::{
    init_memory_database, recalls, Classification, Recall, RecallFilters, Source,
};

fn sample_recall(number: &str, source: Source, date: NaiveDate) -> Recall {
    Recall {
        recall_number: number.to_string(),
        source,
        title: format!("Recall {}", number),
        product_description: "Contaminated widget batch".to_string(),
        reason_for_recall: "Possible Salmonella contamination".to_string(),
        company_name: "Acme Foods".to_string(),
        classification: Classification::ClassII,
        distribution_pattern: "CA, NY".to_string(),
        state: Some("CA".to_string()),
        recall_initiation_date: date,
        report_date: None,
        product_type: "Food".to_string(),
        hazard: None,
        status: Some("Active".to_string()),
        image_url: None,
        source_url: None,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_upsert_is_idempotent() {
    let pool = init_memory_database().await.unwrap();
    let recall = sample_recall("F-001-2024", Source::Fda, date(2024, 1, 15));

    recalls::upsert_recall(&pool, &recall).await.unwrap();
    recalls::upsert_recall(&pool, &recall).await.unwrap();

    assert_eq!(recalls::count_recalls(&pool).await.unwrap(), 1);

    let stored = recalls::get_recall(&pool, "F-001-2024").await.unwrap().unwrap();
    assert_eq!(stored.recall.title, "Recall F-001-2024");
}

#[tokio::test]
async fn test_reingested_record_overwrites_fields() {
    let pool = init_memory_database().await.unwrap();
    let mut recall = sample_recall("F-002-2024", Source::Fda, date(2024, 1, 15));
    recalls::upsert_recall(&pool, &recall).await.unwrap();

    recall.title = "Expanded recall".to_string();
    recall.classification = Classification::ClassI;
    recall.state = Some("NY".to_string());
    recalls::upsert_recall(&pool, &recall).await.unwrap();

    assert_eq!(recalls::count_recalls(&pool).await.unwrap(), 1);
    let stored = recalls::get_recall(&pool, "F-002-2024").await.unwrap().unwrap();
    assert_eq!(stored.recall.title, "Expanded recall");
    assert_eq!(stored.recall.classification, Classification::ClassI);
    assert_eq!(stored.recall.state.as_deref(), Some("NY"));
}

#[tokio::test]
async fn test_source_is_immutable_under_update() {
    let pool = init_memory_database().await.unwrap();
    let recall = sample_recall("X-100", Source::Fda, date(2024, 1, 15));
    recalls::upsert_recall(&pool, &recall).await.unwrap();

    // Same recall number arriving attributed to a different source must not
    // rewrite provenance
    let mut conflicting = recall.clone();
    conflicting.source = Source::Usda;
    recalls::upsert_recall(&pool, &conflicting).await.unwrap();

    let stored = recalls::get_recall(&pool, "X-100").await.unwrap().unwrap();
    assert_eq!(stored.recall.source, Source::Fda);
}

#[tokio::test]
async fn test_search_filters_by_source() {
    let pool = init_memory_database().await.unwrap();
    recalls::upsert_recall(&pool, &sample_recall("F-1", Source::Fda, date(2024, 1, 10)))
        .await
        .unwrap();
    recalls::upsert_recall(&pool, &sample_recall("U-1", Source::Usda, date(2024, 1, 11)))
        .await
        .unwrap();

    let filters = RecallFilters {
        source: Some(Source::Fda),
        limit: 50,
        ..Default::default()
    };
    let page = recalls::search_recalls(&pool, &filters).await.unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(page.recalls.len(), 1);
    assert_eq!(page.recalls[0].recall.source, Source::Fda);
}

#[tokio::test]
async fn test_search_date_range_is_inclusive() {
    let pool = init_memory_database().await.unwrap();
    for (n, d) in [
        ("R-1", date(2024, 1, 9)),
        ("R-2", date(2024, 1, 10)),
        ("R-3", date(2024, 1, 15)),
        ("R-4", date(2024, 1, 20)),
        ("R-5", date(2024, 1, 21)),
    ] {
        recalls::upsert_recall(&pool, &sample_recall(n, Source::Fda, d))
            .await
            .unwrap();
    }

    let filters = RecallFilters {
        start_date: Some(date(2024, 1, 10)),
        end_date: Some(date(2024, 1, 20)),
        limit: 50,
        ..Default::default()
    };
    let page = recalls::search_recalls(&pool, &filters).await.unwrap();

    assert_eq!(page.total, 3);
    let numbers: Vec<&str> = page
        .recalls
        .iter()
        .map(|r| r.recall.recall_number.as_str())
        .collect();
    // Newest initiation date first
    assert_eq!(numbers, vec!["R-4", "R-3", "R-2"]);
}

#[tokio::test]
async fn test_search_free_text_is_case_insensitive() {
    let pool = init_memory_database().await.unwrap();
    let mut match_hit = sample_recall("F-10", Source::Fda, date(2024, 1, 10));
    match_hit.reason_for_recall = "Undeclared peanut allergen".to_string();
    recalls::upsert_recall(&pool, &match_hit).await.unwrap();

    let mut miss = sample_recall("F-11", Source::Fda, date(2024, 1, 11));
    miss.reason_for_recall = "Foreign material".to_string();
    miss.product_description = "Steel bolts".to_string();
    miss.title = "Bolt recall".to_string();
    miss.company_name = "Bolt Co".to_string();
    recalls::upsert_recall(&pool, &miss).await.unwrap();

    let filters = RecallFilters {
        query: Some("PEANUT".to_string()),
        limit: 50,
        ..Default::default()
    };
    let page = recalls::search_recalls(&pool, &filters).await.unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(page.recalls[0].recall.recall_number, "F-10");
}

#[tokio::test]
async fn test_search_classification_and_state_filters() {
    let pool = init_memory_database().await.unwrap();
    let mut class_one = sample_recall("C-1", Source::Fda, date(2024, 1, 10));
    class_one.classification = Classification::ClassI;
    class_one.state = Some("TX".to_string());
    recalls::upsert_recall(&pool, &class_one).await.unwrap();
    recalls::upsert_recall(&pool, &sample_recall("C-2", Source::Fda, date(2024, 1, 11)))
        .await
        .unwrap();

    let filters = RecallFilters {
        classification: Some(Classification::ClassI),
        state: Some("TX".to_string()),
        limit: 50,
        ..Default::default()
    };
    let page = recalls::search_recalls(&pool, &filters).await.unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(page.recalls[0].recall.recall_number, "C-1");
}

#[tokio::test]
async fn test_search_pagination_offsets() {
    let pool = init_memory_database().await.unwrap();
    for i in 0..25 {
        recalls::upsert_recall(
            &pool,
            &sample_recall(&format!("P-{:02}", i), Source::Fda, date(2024, 1, 1 + i)),
        )
        .await
        .unwrap();
    }

    let filters = RecallFilters {
        limit: 10,
        offset: 20,
        ..Default::default()
    };
    let page = recalls::search_recalls(&pool, &filters).await.unwrap();

    assert_eq!(page.total, 25);
    assert_eq!(page.recalls.len(), 5);
}

#[tokio::test]
async fn test_stats_aggregates() {
    let pool = init_memory_database().await.unwrap();
    let today = Utc::now().date_naive();

    let mut recent = sample_recall("S-1", Source::Fda, today - Duration::days(5));
    recent.classification = Classification::ClassI;
    recalls::upsert_recall(&pool, &recent).await.unwrap();

    recalls::upsert_recall(
        &pool,
        &sample_recall("S-2", Source::Usda, today - Duration::days(10)),
    )
    .await
    .unwrap();
    recalls::upsert_recall(
        &pool,
        &sample_recall("S-3", Source::Usda, today - Duration::days(90)),
    )
    .await
    .unwrap();

    let stats = recalls::recall_stats(&pool).await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.by_source.get("FDA"), Some(&1));
    assert_eq!(stats.by_source.get("USDA"), Some(&2));
    assert_eq!(stats.by_classification.get("Class I"), Some(&1));
    assert_eq!(stats.by_classification.get("Class II"), Some(&2));
    assert_eq!(stats.last_30_days, 2);
}

#[tokio::test]
async fn test_init_database_creates_file_and_schema() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("recalls.db");

    let pool = recallwatch_common::db::init_database(&db_path).await.unwrap();
    assert!(db_path.exists());

    // Schema application is idempotent and table is usable
    recalls::upsert_recall(
        &pool,
        &sample_recall("D-1", Source::Cpsc, date(2024, 2, 2)),
    )
    .await
    .unwrap();
    assert_eq!(recalls::count_recalls(&pool).await.unwrap(), 1);
}
