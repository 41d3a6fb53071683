//! Per-source normalization into the canonical recall shape
//!
//! Each government API has its own schema; these functions map a
//! source-native record into one `Recall`, inferring classification,
//! product type, and state where the source does not supply them directly.

use crate::sources::cpsc::CpscRecall;
use crate::sources::fda::FdaRecall;
use crate::sources::parse_iso_date;
use crate::sources::usda::UsdaRecall;
use chrono::{NaiveDate, Utc};
use recallwatch_common::db::{Classification, Recall, Source};

/// Titles are clipped to this many characters when derived from a
/// description field
const TITLE_MAX_CHARS: usize = 255;

const FDA_RECALLS_URL: &str =
    "https://www.fda.gov/safety/recalls-market-withdrawals-safety-alerts";
const USDA_RECALLS_URL: &str = "https://www.fsis.usda.gov/recalls";

/// Map an FDA enforcement record into the canonical shape.
///
/// FDA already labels recalls Class I/II/III, so classification passes
/// through verbatim; state is taken from the record or derived from the
/// distribution text.
pub fn normalize_fda(record: FdaRecall) -> Recall {
    let state = non_empty(record.state.clone())
        .or_else(|| extract_state(&record.distribution_pattern));

    Recall {
        recall_number: record.recall_number,
        source: Source::Fda,
        title: clip_title(&record.product_description)
            .unwrap_or_else(|| "Unknown Product".to_string()),
        product_description: record.product_description,
        reason_for_recall: record.reason_for_recall,
        company_name: non_empty(record.company_name)
            .unwrap_or_else(|| "Unknown Company".to_string()),
        classification: Classification::parse_exact(&record.classification),
        distribution_pattern: record.distribution_pattern,
        state,
        recall_initiation_date: parse_fda_date(&record.recall_initiation_date)
            .unwrap_or_else(|| Utc::now().date_naive()),
        report_date: parse_fda_date(&record.report_date),
        product_type: non_empty(record.product_type).unwrap_or_else(|| "Food".to_string()),
        hazard: None,
        status: Some(non_empty(record.status).unwrap_or_else(|| "Active".to_string())),
        image_url: None,
        source_url: Some(FDA_RECALLS_URL.to_string()),
    }
}

/// Map a USDA FSIS record into the canonical shape
pub fn normalize_usda(record: UsdaRecall) -> Recall {
    let title = non_empty(record.product_name.clone())
        .or_else(|| clip_title(&record.summary))
        .unwrap_or_else(|| "USDA Recall".to_string());

    let description = non_empty(record.summary.clone())
        .or_else(|| non_empty(record.press_release.clone()))
        .unwrap_or_else(|| record.product_name.clone());

    let reason = non_empty(record.reason.clone())
        .or_else(|| non_empty(record.hazard.clone()))
        .unwrap_or_else(|| "Unknown".to_string());

    Recall {
        recall_number: record.recall_number,
        source: Source::Usda,
        title,
        product_description: description,
        reason_for_recall: reason,
        company_name: non_empty(record.company_name)
            .unwrap_or_else(|| "Unknown".to_string()),
        classification: classify_usda(&record.recall_class),
        distribution_pattern: record.distribution,
        state: non_empty(record.state),
        recall_initiation_date: parse_iso_date(&record.recall_date)
            .unwrap_or_else(|| Utc::now().date_naive()),
        report_date: None,
        product_type: non_empty(record.product_type)
            .unwrap_or_else(|| "Meat/Poultry".to_string()),
        hazard: non_empty(record.hazard),
        status: Some("Active".to_string()),
        image_url: record.images.into_iter().find(|i| !i.trim().is_empty()),
        source_url: Some(USDA_RECALLS_URL.to_string()),
    }
}

/// Map a CPSC record into the canonical shape.
///
/// CPSC has no native classification and no distribution data, so severity
/// is inferred from injury/hazard text and distribution is recorded as
/// nationwide.
pub fn normalize_cpsc(record: CpscRecall) -> Recall {
    let recall_number = if record.recall_number.trim().is_empty() {
        format!("CPSC-{}", record.recall_id.to_string().trim_matches('"'))
    } else {
        record.recall_number.clone()
    };

    let classification = infer_cpsc_classification(&record);
    let product_type = infer_cpsc_product_type(&record);

    let hazard_text = join_names(record.hazards.iter().map(|h| h.name.as_str()));
    let company = record
        .manufacturers
        .first()
        .and_then(|m| non_empty(m.name.clone()))
        .unwrap_or_else(|| "Unknown".to_string());
    let image_url = record
        .images
        .first()
        .and_then(|i| non_empty(i.url.clone()));

    let description = non_empty(record.description.clone())
        .or_else(|| record.products.first().and_then(|p| non_empty(p.description.clone())))
        .unwrap_or_default();

    Recall {
        recall_number,
        source: Source::Cpsc,
        title: clip_title(&record.title).unwrap_or_else(|| "CPSC Recall".to_string()),
        product_description: description,
        reason_for_recall: non_empty(hazard_text.clone())
            .unwrap_or_else(|| "Safety hazard".to_string()),
        company_name: company,
        classification,
        // CPSC doesn't provide distribution data
        distribution_pattern: "Nationwide".to_string(),
        state: Some("US".to_string()),
        recall_initiation_date: parse_iso_date(&record.recall_date)
            .unwrap_or_else(|| Utc::now().date_naive()),
        report_date: parse_iso_date(&record.last_publish_date),
        product_type,
        hazard: non_empty(hazard_text),
        status: Some("Active".to_string()),
        image_url,
        source_url: non_empty(record.url),
    }
}

/// Normalize a raw USDA class string to a classification.
///
/// Lexical heuristic over the raw text. Checking III before II before I
/// matters: "Class III" contains all three substrings, and matching the
/// shortest first would misreport the least severe category as Class I.
/// An empty or unrecognized class falls back to Class III.
pub fn classify_usda(recall_class: &str) -> Classification {
    let upper = recall_class.to_uppercase();
    if upper.contains("III") || upper.contains('3') {
        Classification::ClassIII
    } else if upper.contains("II") || upper.contains('2') {
        Classification::ClassII
    } else if upper.contains('I') || upper.contains('1') {
        Classification::ClassI
    } else {
        Classification::ClassIII
    }
}

/// Infer a classification for a CPSC recall from injury and hazard text.
///
/// Any mention of death/serious/severe injuries is Class I; any injury at
/// all is Class II; life-threatening hazard keywords are Class I; other
/// hazards Class II; neither injuries nor hazards is Class III.
pub fn infer_cpsc_classification(record: &CpscRecall) -> Classification {
    if !record.injuries.is_empty() {
        let injury_text = join_names(record.injuries.iter().map(|i| i.name.as_str())).to_lowercase();
        if injury_text.contains("death")
            || injury_text.contains("serious")
            || injury_text.contains("severe")
        {
            return Classification::ClassI;
        }
        return Classification::ClassII;
    }

    if !record.hazards.is_empty() {
        let hazard_text = join_names(record.hazards.iter().map(|h| h.name.as_str())).to_lowercase();
        const SEVERE_HAZARDS: [&str; 4] = ["fire", "choking", "poison", "laceration"];
        if SEVERE_HAZARDS.iter().any(|k| hazard_text.contains(k)) {
            return Classification::ClassI;
        }
        return Classification::ClassII;
    }

    Classification::ClassIII
}

/// Infer the product type of a CPSC recall from its first product
pub fn infer_cpsc_product_type(record: &CpscRecall) -> String {
    let Some(product) = record.products.first() else {
        return "Consumer Product".to_string();
    };

    let label = if product.product_type.trim().is_empty() {
        &product.name
    } else {
        &product.product_type
    };

    const FOOD_KEYWORDS: [&str; 6] = ["food", "beverage", "drink", "snack", "meal", "dietary"];
    let lower = label.to_lowercase();
    if FOOD_KEYWORDS.iter().any(|k| lower.contains(k)) {
        "Food Product".to_string()
    } else {
        "Consumer Product".to_string()
    }
}

/// Parse an 8-digit YYYYMMDD date string as used by the FDA API
pub fn parse_fda_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y%m%d").ok()
}

/// Extract a state code from free-text distribution data.
///
/// "Nationwide" (case-insensitive, anywhere in the text) maps to "US";
/// otherwise the first standalone 2-letter uppercase token wins.
pub fn extract_state(distribution: &str) -> Option<String> {
    if distribution.trim().is_empty() {
        return None;
    }

    if distribution.to_lowercase().contains("nationwide") {
        return Some("US".to_string());
    }

    distribution
        .split(|c: char| !c.is_ascii_alphabetic())
        .find(|token| token.len() == 2 && token.bytes().all(|b| b.is_ascii_uppercase()))
        .map(|token| token.to_string())
}

/// Clip a description down to a title, safely on char boundaries
fn clip_title(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(TITLE_MAX_CHARS).collect())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names
        .filter(|n| !n.trim().is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
