//! USDA FSIS recall API client
//!
//! Fetches meat/poultry recall records from the FSIS recall API. The
//! windowed request runs under a bounded retry policy; if every attempt
//! fails, the client falls back to one unfiltered request and filters by
//! recall date on our side, since the FSIS date parameters have been
//! unreliable in practice.

use super::retry::RetryPolicy;
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use recallwatch_common::{Error, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

const USDA_BASE_URL: &str = "https://www.fsis.usda.gov/fsis/api/recall/v/1";
const USDA_TIMEOUT: Duration = Duration::from_secs(30);

/// Raw FSIS recall record, source-native shape
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsdaRecall {
    #[serde(default)]
    pub recall_number: String,
    #[serde(default)]
    pub recall_class: String,
    #[serde(default)]
    pub press_release: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub hazard: String,
    #[serde(default)]
    pub state: String,
    /// ISO date string
    #[serde(default)]
    pub recall_date: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub product_type: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub distribution: String,
    #[serde(default)]
    pub images: Vec<String>,
}

/// FSIS responses arrive either as a bare array or wrapped in `results`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UsdaResponse {
    Wrapped {
        #[serde(default)]
        results: Vec<UsdaRecall>,
    },
    Bare(Vec<UsdaRecall>),
}

impl UsdaResponse {
    fn into_results(self) -> Vec<UsdaRecall> {
        match self {
            UsdaResponse::Wrapped { results } => results,
            UsdaResponse::Bare(results) => results,
        }
    }
}

/// USDA FSIS recall API client
pub struct UsdaClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl UsdaClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(USDA_BASE_URL.to_string(), RetryPolicy::default())
    }

    /// Point the client at an alternate endpoint with a custom retry policy (tests)
    pub fn with_base_url(base_url: String, retry: RetryPolicy) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("recallwatch/", env!("CARGO_PKG_VERSION")))
            .timeout(USDA_TIMEOUT)
            .build()?;
        Ok(Self { http, base_url, retry })
    }

    /// Fetch recalls within the last `window_days` days.
    ///
    /// Retries the windowed request per the policy, then falls back to an
    /// unfiltered request with client-side date filtering.
    pub async fn fetch(&self, window_days: u32, limit: u32) -> Result<Vec<UsdaRecall>> {
        let end = Utc::now().date_naive();
        let start = end - ChronoDuration::days(window_days as i64);

        let windowed_url = format!(
            "{}?startDate={}&endDate={}&limit={}",
            self.base_url, start, end, limit
        );

        let windowed = self
            .retry
            .run("usda windowed fetch", || self.request(&windowed_url))
            .await;

        match windowed {
            Ok(results) => {
                info!(count = results.len(), "Fetched USDA recalls");
                Ok(results)
            }
            Err(err) => {
                warn!(error = %err, "USDA windowed fetch failed, falling back to unfiltered request");
                let fallback_url = format!("{}?limit={}", self.base_url, limit);
                let results = self.request(&fallback_url).await?;
                let filtered = filter_by_recall_date(results, start, end);
                info!(count = filtered.len(), "Fetched USDA recalls (client-side filtered)");
                Ok(filtered)
            }
        }
    }

    async fn request(&self, url: &str) -> Result<Vec<UsdaRecall>> {
        debug!(url = %url, "Querying USDA FSIS recall API");

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Source(format!("USDA API error: {}", status.as_u16())));
        }

        let body: UsdaResponse = response
            .json()
            .await
            .map_err(|e| Error::Source(format!("USDA response parse error: {}", e)))?;

        Ok(body.into_results())
    }
}

/// Keep only records whose recall date falls inside [start, end] inclusive.
///
/// Records with unparseable dates are dropped: without a date they cannot
/// satisfy a windowed fetch.
fn filter_by_recall_date(
    recalls: Vec<UsdaRecall>,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<UsdaRecall> {
    recalls
        .into_iter()
        .filter(|r| match super::parse_iso_date(&r.recall_date) {
            Some(date) => date >= start && date <= end,
            None => false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recall_on(date: &str) -> UsdaRecall {
        let json = format!(r#"{{"recallNumber": "013-2024", "recallDate": "{}"}}"#, date);
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_wrapped_and_bare_responses() {
        let wrapped: UsdaResponse =
            serde_json::from_str(r#"{"results": [{"recallNumber": "013-2024"}]}"#).unwrap();
        assert_eq!(wrapped.into_results().len(), 1);

        let bare: UsdaResponse =
            serde_json::from_str(r#"[{"recallNumber": "013-2024"}]"#).unwrap();
        assert_eq!(bare.into_results().len(), 1);
    }

    #[test]
    fn test_filter_by_recall_date_inclusive_bounds() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();

        let recalls = vec![
            recall_on("2024-01-09"),
            recall_on("2024-01-10"),
            recall_on("2024-01-15"),
            recall_on("2024-01-20"),
            recall_on("2024-01-21"),
            recall_on("not-a-date"),
        ];

        let kept = filter_by_recall_date(recalls, start, end);
        let dates: Vec<&str> = kept.iter().map(|r| r.recall_date.as_str()).collect();
        assert_eq!(dates, vec!["2024-01-10", "2024-01-15", "2024-01-20"]);
    }
}
