//! FDA openFDA enforcement API client
//!
//! Fetches food recall records from https://api.fda.gov/food/enforcement.json
//! within a bounded lookback window. Dates on the wire are 8-digit YYYYMMDD
//! strings.

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use recallwatch_common::{Error, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

const FDA_BASE_URL: &str = "https://api.fda.gov/food/enforcement.json";
const FDA_TIMEOUT: Duration = Duration::from_secs(10);

/// Raw FDA enforcement record, source-native shape
#[derive(Debug, Clone, Deserialize)]
pub struct FdaRecall {
    #[serde(default)]
    pub recall_number: String,
    #[serde(default)]
    pub product_description: String,
    #[serde(default)]
    pub reason_for_recall: String,
    #[serde(default)]
    pub company_name: String,
    /// Already "Class I" / "Class II" / "Class III" on the wire
    #[serde(default)]
    pub classification: String,
    #[serde(default)]
    pub distribution_pattern: String,
    #[serde(default)]
    pub state: String,
    /// YYYYMMDD
    #[serde(default)]
    pub recall_initiation_date: String,
    /// YYYYMMDD
    #[serde(default)]
    pub report_date: String,
    #[serde(default)]
    pub product_type: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct FdaResponse {
    #[serde(default)]
    results: Vec<FdaRecall>,
}

/// openFDA enforcement API client
pub struct FdaClient {
    http: reqwest::Client,
    base_url: String,
}

impl FdaClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(FDA_BASE_URL.to_string())
    }

    /// Point the client at an alternate endpoint (tests)
    pub fn with_base_url(base_url: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("recallwatch/", env!("CARGO_PKG_VERSION")))
            .timeout(FDA_TIMEOUT)
            .build()?;
        Ok(Self { http, base_url })
    }

    /// Fetch recalls initiated within the last `window_days` days
    pub async fn fetch(&self, window_days: u32, limit: u32) -> Result<Vec<FdaRecall>> {
        let end = Utc::now().date_naive();
        let start = end - ChronoDuration::days(window_days as i64);

        let search = format!(
            "recall_initiation_date:[{}+TO+{}]",
            format_fda_date(start),
            format_fda_date(end)
        );
        let url = format!("{}?search={}&limit={}", self.base_url, search, limit);

        debug!(url = %url, "Querying openFDA enforcement API");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Source(format!(
                "FDA API error: {} {}",
                status.as_u16(),
                text
            )));
        }

        let body: FdaResponse = response
            .json()
            .await
            .map_err(|e| Error::Source(format!("FDA response parse error: {}", e)))?;

        info!(count = body.results.len(), "Fetched FDA recalls");
        Ok(body.results)
    }
}

/// Format a date as the 8-digit YYYYMMDD form the FDA API expects
pub fn format_fda_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}
