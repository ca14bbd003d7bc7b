// NAV Domain Model

use crate::domain::error::{DomainError, Result};
use crate::domain::fund::SchemeCode;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format used by AMFI / mfapi ("03-01-2024")
pub const AMFI_DATE_FORMAT: &str = "%d-%m-%Y";

/// A single published NAV
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavPoint {
    pub date: NaiveDate,
    pub nav: f64,
}

impl NavPoint {
    pub fn new(date: NaiveDate, nav: f64) -> Self {
        Self { date, nav }
    }

    /// Parse the raw (date, nav) string pair as published by AMFI
    pub fn parse(date: &str, nav: &str) -> Result<Self> {
        let date = parse_amfi_date(date)?;
        let nav = parse_nav(nav)?;
        Ok(Self { date, nav })
    }
}

/// Parse a `dd-mm-yyyy` date
pub fn parse_amfi_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), AMFI_DATE_FORMAT)
        .map_err(|e| DomainError::InvalidDate(format!("{}: {}", raw, e)))
}

/// Parse a NAV decimal string; rejects NaN/inf
pub fn parse_nav(raw: &str) -> Result<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| DomainError::InvalidNav(raw.to_string()))?;

    if !value.is_finite() {
        return Err(DomainError::InvalidNav(raw.to_string()));
    }
    Ok(value)
}

/// Full NAV history of one scheme, always ascending by date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "NavHistoryWire")]
pub struct NavHistory {
    pub code: SchemeCode,
    pub scheme_name: Option<String>,
    pub fund_house: Option<String>,
    points: Vec<NavPoint>,
}

/// Deserialized shape of `NavHistory` before the points are sorted
#[derive(Deserialize)]
struct NavHistoryWire {
    code: SchemeCode,
    #[serde(default)]
    scheme_name: Option<String>,
    #[serde(default)]
    fund_house: Option<String>,
    points: Vec<NavPoint>,
}

impl From<NavHistoryWire> for NavHistory {
    fn from(wire: NavHistoryWire) -> Self {
        NavHistory::new(wire.code, wire.points).with_meta(wire.scheme_name, wire.fund_house)
    }
}

impl NavHistory {
    /// Create a history; points are sorted oldest -> newest
    pub fn new(code: SchemeCode, mut points: Vec<NavPoint>) -> Self {
        points.sort_by_key(|p| p.date);
        Self {
            code,
            scheme_name: None,
            fund_house: None,
            points,
        }
    }

    pub fn empty(code: SchemeCode) -> Self {
        Self::new(code, Vec::new())
    }

    pub fn with_meta(mut self, scheme_name: Option<String>, fund_house: Option<String>) -> Self {
        self.scheme_name = scheme_name;
        self.fund_house = fund_house;
        self
    }

    pub fn points(&self) -> &[NavPoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<NavPoint> {
        self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn latest(&self) -> Option<&NavPoint> {
        self.points.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_point() {
        let point = NavPoint::parse("03-01-2024", "65.4321").unwrap();
        assert_eq!(point.date, d(2024, 1, 3));
        assert!((point.nav - 65.4321).abs() < 1e-9);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            NavPoint::parse("2024-01-03", "10.0"),
            Err(DomainError::InvalidDate(_))
        ));
        assert!(matches!(
            NavPoint::parse("03-01-2024", "N.A."),
            Err(DomainError::InvalidNav(_))
        ));
        assert!(matches!(
            NavPoint::parse("03-01-2024", "NaN"),
            Err(DomainError::InvalidNav(_))
        ));
    }

    #[test]
    fn test_history_sorted_ascending() {
        let code = SchemeCode::new("122639").unwrap();
        let history = NavHistory::new(
            code,
            vec![
                NavPoint::new(d(2024, 3, 3), 12.0),
                NavPoint::new(d(2024, 1, 3), 10.0),
                NavPoint::new(d(2024, 2, 3), 11.0),
            ],
        );

        let dates: Vec<NaiveDate> = history.points().iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![d(2024, 1, 3), d(2024, 2, 3), d(2024, 3, 3)]);
        assert_eq!(history.latest().unwrap().nav, 12.0);
    }

    #[test]
    fn test_deserialize_sorts_points() {
        let history: NavHistory = serde_json::from_str(
            r#"{
                "code": "122639",
                "scheme_name": "Parag Parikh Flexi Cap Fund - Direct Plan - Growth",
                "points": [
                    {"date": "2024-03-03", "nav": 12.0},
                    {"date": "2024-01-03", "nav": 10.0}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(history.points()[0].date, d(2024, 1, 3));
        assert_eq!(history.latest().unwrap().nav, 12.0);
        assert!(history.fund_house.is_none());
        assert!(history.scheme_name.unwrap().starts_with("Parag Parikh"));
    }
}
