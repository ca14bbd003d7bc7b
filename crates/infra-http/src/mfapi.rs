// mfapi.in adapter - AMFI-published NAV history per scheme

use crate::client::{HttpFetcher, HttpSettings};
use async_trait::async_trait;
use navtrack_core::domain::{NavHistory, NavPoint, SchemeCode};
use navtrack_core::port::{NavSource, SourceError, SourceResult};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct HistoryBody {
    #[serde(default)]
    meta: Option<HistoryMeta>,
    #[serde(default)]
    data: Option<Vec<HistoryRow>>,
}

#[derive(Debug, Deserialize)]
struct HistoryMeta {
    scheme_name: Option<String>,
    fund_house: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryRow {
    date: String,
    nav: String,
}

/// Parse a `GET /mf/{code}` response body
///
/// Missing or empty `data` yields an empty history.
pub fn parse_history_body(code: &SchemeCode, body: &str) -> SourceResult<NavHistory> {
    let parsed: HistoryBody = serde_json::from_str(body)
        .map_err(|e| SourceError::Parse(format!("mfapi response for {}: {}", code, e)))?;

    let rows = parsed.data.unwrap_or_default();
    let points = rows
        .iter()
        .map(|row| {
            NavPoint::parse(&row.date, &row.nav).map_err(|e| {
                SourceError::Parse(format!(
                    "mfapi row for {} ({} / {}): {}",
                    code, row.date, row.nav, e
                ))
            })
        })
        .collect::<SourceResult<Vec<_>>>()?;

    let (scheme_name, fund_house) = match parsed.meta {
        Some(meta) => (meta.scheme_name, meta.fund_house),
        None => (None, None),
    };

    Ok(NavHistory::new(code.clone(), points).with_meta(scheme_name, fund_house))
}

/// `NavSource` backed by https://api.mfapi.in
#[derive(Clone)]
pub struct MfApiClient {
    http: HttpFetcher,
}

impl MfApiClient {
    pub fn new(settings: &HttpSettings) -> SourceResult<Self> {
        Ok(Self {
            http: HttpFetcher::new(settings, &settings.mfapi_base_url)?,
        })
    }
}

#[async_trait]
impl NavSource for MfApiClient {
    async fn fetch_history(&self, code: &SchemeCode) -> SourceResult<NavHistory> {
        let body = self.http.get_text(&format!("/mf/{}", code), &[]).await?;
        let history = parse_history_body(code, &body)?;
        debug!(code = %code, points = history.len(), "Parsed mfapi history");
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn code() -> SchemeCode {
        SchemeCode::new("122639").unwrap()
    }

    #[test]
    fn test_parse_history_sorts_ascending() {
        let body = r#"{
            "meta": {
                "fund_house": "PPFAS Mutual Fund",
                "scheme_type": "Open Ended Schemes",
                "scheme_name": "Parag Parikh Flexi Cap Fund - Direct Plan - Growth",
                "scheme_code": 122639
            },
            "data": [
                {"date": "03-01-2025", "nav": "85.12340"},
                {"date": "02-01-2025", "nav": "84.90000"},
                {"date": "31-12-2024", "nav": "84.10000"}
            ],
            "status": "SUCCESS"
        }"#;

        let history = parse_history_body(&code(), body).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history.fund_house.as_deref(), Some("PPFAS Mutual Fund"));

        let points = history.points();
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
        assert_eq!(history.latest().unwrap().nav, 85.1234);
    }

    #[test]
    fn test_parse_history_without_data_is_empty() {
        let body = r#"{"meta": {}, "data": [], "status": "SUCCESS"}"#;
        let history = parse_history_body(&code(), body).unwrap();
        assert!(history.is_empty());

        let history = parse_history_body(&code(), r#"{"status": "ERROR"}"#).unwrap();
        assert!(history.is_empty());
        assert!(history.scheme_name.is_none());
    }

    #[test]
    fn test_parse_history_bad_row() {
        let body = r#"{"data": [{"date": "2025-01-03", "nav": "85.1"}]}"#;
        assert!(matches!(parse_history_body(&code(), body), Err(SourceError::Parse(_))));

        let body = r#"{"data": [{"date": "03-01-2025", "nav": "N.A."}]}"#;
        assert!(matches!(parse_history_body(&code(), body), Err(SourceError::Parse(_))));
    }

    #[test]
    fn test_parse_history_not_json() {
        assert!(matches!(
            parse_history_body(&code(), "<html>502</html>"),
            Err(SourceError::Parse(_))
        ));
    }
}
