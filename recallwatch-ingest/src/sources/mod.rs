//! Source adapters for the three government recall APIs
//!
//! Each client fetches source-native record shapes within a bounded lookback
//! window and returns errors instead of panicking, so the orchestrator can
//! fail soft per source.

pub mod cpsc;
pub mod fda;
pub mod retry;
pub mod usda;

pub use cpsc::CpscClient;
pub use fda::FdaClient;
pub use retry::RetryPolicy;
pub use usda::UsdaClient;

use chrono::NaiveDate;

/// Parse an ISO-ish date string as produced by the USDA and CPSC APIs.
///
/// Accepts plain `YYYY-MM-DD` as well as full datetime forms with a `T`
/// separator; anything else is `None`.
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let date_part = s.split('T').next().unwrap_or(s).trim();
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso_date_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(parse_iso_date("2024-05-01"), Some(expected));
        assert_eq!(parse_iso_date("2024-05-01T00:00:00"), Some(expected));
        assert_eq!(parse_iso_date(" 2024-05-01 "), Some(expected));
        assert_eq!(parse_iso_date("05/01/2024"), None);
        assert_eq!(parse_iso_date(""), None);
    }
}
