//! CPSC (Consumer Product Safety Commission) recall API client
//!
//! Fetches consumer product recall records from saferproducts.gov. CPSC
//! records carry nested product/hazard/injury arrays and no Class I/II/III
//! label; classification is inferred during normalization.

use chrono::{Duration as ChronoDuration, Utc};
use recallwatch_common::{Error, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

const CPSC_BASE_URL: &str = "https://www.saferproducts.gov/RestWebServices/Recall";
const CPSC_TIMEOUT: Duration = Duration::from_secs(15);

/// Raw CPSC recall record, source-native shape (PascalCase on the wire)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CpscRecall {
    #[serde(rename = "RecallID")]
    pub recall_id: serde_json::Value,
    pub recall_number: String,
    /// ISO date string
    pub recall_date: String,
    pub description: String,
    #[serde(rename = "URL")]
    pub url: String,
    pub title: String,
    pub last_publish_date: String,
    pub products: Vec<CpscProduct>,
    pub hazards: Vec<CpscHazard>,
    pub manufacturers: Vec<CpscManufacturer>,
    pub images: Vec<CpscImage>,
    pub injuries: Vec<CpscInjury>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CpscProduct {
    pub name: String,
    pub description: String,
    #[serde(rename = "Type")]
    pub product_type: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CpscHazard {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CpscManufacturer {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CpscImage {
    #[serde(rename = "URL")]
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CpscInjury {
    pub name: String,
}

/// CPSC responses arrive either as a bare array or wrapped in an object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CpscResponse {
    Bare(Vec<CpscRecall>),
    Wrapped {
        #[serde(default, alias = "results")]
        recalls: Vec<CpscRecall>,
    },
}

impl CpscResponse {
    fn into_results(self) -> Vec<CpscRecall> {
        match self {
            CpscResponse::Bare(recalls) => recalls,
            CpscResponse::Wrapped { recalls } => recalls,
        }
    }
}

/// saferproducts.gov recall API client
pub struct CpscClient {
    http: reqwest::Client,
    base_url: String,
}

impl CpscClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(CPSC_BASE_URL.to_string())
    }

    /// Point the client at an alternate endpoint (tests)
    pub fn with_base_url(base_url: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("recallwatch/", env!("CARGO_PKG_VERSION")))
            .timeout(CPSC_TIMEOUT)
            .build()?;
        Ok(Self { http, base_url })
    }

    /// Fetch recalls announced within the last `window_days` days.
    ///
    /// The API has no limit parameter, so the result is truncated client-side.
    pub async fn fetch(&self, window_days: u32, limit: u32) -> Result<Vec<CpscRecall>> {
        let end = Utc::now().date_naive();
        let start = end - ChronoDuration::days(window_days as i64);

        let url = format!(
            "{}?RecallDateStart={}&RecallDateEnd={}&format=json",
            self.base_url, start, end
        );

        debug!(url = %url, "Querying CPSC recall API");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Source(format!("CPSC API error: {}", status.as_u16())));
        }

        let body: CpscResponse = response
            .json()
            .await
            .map_err(|e| Error::Source(format!("CPSC response parse error: {}", e)))?;

        let mut results = body.into_results();
        results.truncate(limit as usize);

        info!(count = results.len(), "Fetched CPSC recalls");
        Ok(results)
    }
}
