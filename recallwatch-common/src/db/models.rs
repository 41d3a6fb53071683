//! Canonical recall data model shared by the ingestion and query layers

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Government agency a recall record originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "FDA")]
    Fda,
    #[serde(rename = "USDA")]
    Usda,
    #[serde(rename = "CPSC")]
    Cpsc,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Fda => "FDA",
            Source::Usda => "USDA",
            Source::Cpsc => "CPSC",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FDA" => Ok(Source::Fda),
            "USDA" => Ok(Source::Usda),
            "CPSC" => Ok(Source::Cpsc),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown recall source: {}",
                other
            ))),
        }
    }
}

/// Severity ranking of a recall, normalized across sources.
///
/// Class I is the most severe (life-threatening), Class III the least.
/// Sources that lack a native classification get one inferred during
/// normalization; anything unparseable lands in `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    #[serde(rename = "Class I")]
    ClassI,
    #[serde(rename = "Class II")]
    ClassII,
    #[serde(rename = "Class III")]
    ClassIII,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::ClassI => "Class I",
            Classification::ClassII => "Class II",
            Classification::ClassIII => "Class III",
            Classification::Unknown => "Unknown",
        }
    }

    /// Parse an exact classification label ("Class I" / "Class II" / "Class III")
    pub fn parse_exact(s: &str) -> Classification {
        match s.trim() {
            "Class I" => Classification::ClassI,
            "Class II" => Classification::ClassII,
            "Class III" => Classification::ClassIII,
            _ => Classification::Unknown,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical recall record, the normalizer's output and the upsert input.
///
/// `recall_number` is the cross-source natural key: re-ingesting a record
/// with the same number updates the existing row in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recall {
    pub recall_number: String,
    pub source: Source,
    pub title: String,
    pub product_description: String,
    pub reason_for_recall: String,
    pub company_name: String,
    pub classification: Classification,
    pub distribution_pattern: String,
    /// 2-letter state code, or "US" for nationwide distribution
    pub state: Option<String>,
    pub recall_initiation_date: NaiveDate,
    pub report_date: Option<NaiveDate>,
    pub product_type: String,
    pub hazard: Option<String>,
    pub status: Option<String>,
    pub image_url: Option<String>,
    pub source_url: Option<String>,
}

/// Persisted recall row as returned by search queries
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecallRow {
    #[serde(flatten)]
    pub recall: Recall,
    pub created_at: String,
    pub updated_at: String,
}

/// Search filter set for recall queries.
///
/// Serialized in full to derive deterministic cache keys, so every field
/// participates in the key and distinct filter combinations never collide.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecallFilters {
    pub source: Option<Source>,
    pub state: Option<String>,
    pub classification: Option<Classification>,
    pub product_type: Option<String>,
    /// Case-insensitive substring match across title, description,
    /// company name, and reason for recall
    pub query: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: i64,
    pub offset: i64,
}

/// One page of search results plus the unpaginated total
#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub recalls: Vec<RecallRow>,
    pub total: i64,
}

/// Aggregate recall counts
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecallStats {
    pub total: i64,
    pub by_source: BTreeMap<String, i64>,
    pub by_classification: BTreeMap<String, i64>,
    pub last_30_days: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_roundtrip() {
        assert_eq!("FDA".parse::<Source>().unwrap(), Source::Fda);
        assert_eq!("usda".parse::<Source>().unwrap(), Source::Usda);
        assert_eq!(Source::Cpsc.as_str(), "CPSC");
        assert!("EPA".parse::<Source>().is_err());
    }

    #[test]
    fn test_classification_parse_exact() {
        assert_eq!(Classification::parse_exact("Class I"), Classification::ClassI);
        assert_eq!(Classification::parse_exact(" Class III "), Classification::ClassIII);
        assert_eq!(Classification::parse_exact("class i"), Classification::Unknown);
        assert_eq!(Classification::parse_exact(""), Classification::Unknown);
    }

    #[test]
    fn test_source_serde_wire_form() {
        let json = serde_json::to_string(&Source::Fda).unwrap();
        assert_eq!(json, "\"FDA\"");
        let c = serde_json::to_string(&Classification::ClassII).unwrap();
        assert_eq!(c, "\"Class II\"");
    }
}
