// Yahoo Finance chart API adapter - monthly index closes

use crate::client::{HttpFetcher, HttpSettings};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};
use navtrack_core::domain::{BenchmarkPoint, BenchmarkSeries};
use navtrack_core::port::{BenchmarkSource, SourceError, SourceResult};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct ChartBody {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds (19800 for NSE)
    #[serde(default)]
    gmtoffset: i32,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    #[serde(default)]
    adjclose: Vec<AdjClose>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Option<Vec<Option<f64>>>,
}

/// Parse a `/v8/finance/chart/{symbol}` response body
///
/// Closes come from `quote[0].close`, falling back to `adjclose[0].adjclose`
/// when the quote block has none. Null closes are skipped; a missing result
/// yields an empty series. Bar dates are taken in the exchange's time zone.
pub fn parse_chart_body(symbol: &str, body: &str) -> SourceResult<BenchmarkSeries> {
    let parsed: ChartBody = serde_json::from_str(body)
        .map_err(|e| SourceError::Parse(format!("chart response for {}: {}", symbol, e)))?;

    if let Some(err) = parsed.chart.error {
        if err.code.eq_ignore_ascii_case("not found") {
            return Err(SourceError::NotFound(format!("{}: {}", symbol, err.description)));
        }
        return Err(SourceError::Parse(format!("{}: {} {}", symbol, err.code, err.description)));
    }

    let Some(result) = parsed.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(BenchmarkSeries::empty(symbol));
    };

    let offset = result
        .meta
        .as_ref()
        .and_then(|meta| FixedOffset::east_opt(meta.gmtoffset))
        .unwrap_or_else(|| Utc.fix());

    let quote_close = result.indicators.quote.into_iter().next().and_then(|q| q.close);
    let closes = match quote_close {
        Some(closes) if closes.iter().any(Option::is_some) => closes,
        _ => result
            .indicators
            .adjclose
            .into_iter()
            .next()
            .and_then(|a| a.adjclose)
            .unwrap_or_default(),
    };

    let mut points = Vec::with_capacity(result.timestamp.len());
    for (ts, close) in result.timestamp.iter().zip(closes) {
        let Some(close) = close.filter(|c| c.is_finite()) else {
            continue;
        };
        points.push(BenchmarkPoint::new(timestamp_to_date(*ts, offset)?, close));
    }

    Ok(BenchmarkSeries::new(symbol, points))
}

fn timestamp_to_date(secs: i64, offset: FixedOffset) -> SourceResult<NaiveDate> {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.with_timezone(&offset).date_naive())
        .ok_or_else(|| SourceError::Parse(format!("timestamp out of range: {}", secs)))
}

fn date_to_timestamp(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// `BenchmarkSource` backed by the Yahoo Finance chart API
#[derive(Clone)]
pub struct YahooChartClient {
    http: HttpFetcher,
}

impl YahooChartClient {
    pub fn new(settings: &HttpSettings) -> SourceResult<Self> {
        Ok(Self {
            http: HttpFetcher::new(settings, &settings.yahoo_base_url)?,
        })
    }
}

#[async_trait]
impl BenchmarkSource for YahooChartClient {
    async fn fetch_monthly(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> SourceResult<BenchmarkSeries> {
        // period2 is exclusive
        let query = [
            ("period1", date_to_timestamp(start).to_string()),
            ("period2", (date_to_timestamp(end) + 86_400).to_string()),
            ("interval", "1mo".to_string()),
        ];

        let body = self
            .http
            .get_text(&format!("/v8/finance/chart/{}", symbol), &query)
            .await?;
        let series = parse_chart_body(symbol, &body)?;
        debug!(symbol = %symbol, points = series.len(), "Parsed chart series");
        Ok(series)
    }
}
