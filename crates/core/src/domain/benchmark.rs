// Benchmark (index) Domain Model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default benchmark: Nifty 50 on Yahoo Finance
pub const NIFTY_50_SYMBOL: &str = "^NSEI";

/// Monthly close of the benchmark index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkPoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl BenchmarkPoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Benchmark price series, always ascending by date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BenchmarkSeriesWire")]
pub struct BenchmarkSeries {
    pub symbol: String,
    points: Vec<BenchmarkPoint>,
}

#[derive(Deserialize)]
struct BenchmarkSeriesWire {
    symbol: String,
    points: Vec<BenchmarkPoint>,
}

impl From<BenchmarkSeriesWire> for BenchmarkSeries {
    fn from(wire: BenchmarkSeriesWire) -> Self {
        BenchmarkSeries::new(wire.symbol, wire.points)
    }
}

impl BenchmarkSeries {
    pub fn new(symbol: impl Into<String>, mut points: Vec<BenchmarkPoint>) -> Self {
        points.sort_by_key(|p| p.date);
        Self {
            symbol: symbol.into(),
            points,
        }
    }

    pub fn empty(symbol: impl Into<String>) -> Self {
        Self::new(symbol, Vec::new())
    }

    pub fn points(&self) -> &[BenchmarkPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_keeps_series_ascending() {
        let series: BenchmarkSeries = serde_json::from_str(
            r#"{"symbol": "^NSEI", "points": [
                {"date": "2025-01-01", "close": 23500.0},
                {"date": "2024-12-01", "close": 24480.0}
            ]}"#,
        )
        .unwrap();

        let dates: Vec<NaiveDate> = series.points().iter().map(|p| p.date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            ]
        );
    }
}
