//! Tracker Service - fund summaries and fund-vs-benchmark analysis
//!
//! Builds the report models served over RPC from the cached market data.

use crate::application::analytics::{
    cagr_over_window, current_and_all_time_high, is_buy_signal, is_underperforming,
    monthly_samples, nearest_index, normalize, pct_change, window_cutoff, MonthlySample,
};
use crate::application::constants::{
    LONG_CAGR_YEARS, SHORT_CAGR_YEARS, WARN_NO_BENCHMARK_DATA, WARN_NO_FUND_DATA,
};
use crate::application::market_data::MarketDataService;
use crate::application::settings::AnalysisSettings;
use crate::domain::{
    AnalysisRow, BenchmarkSeries, ComparisonPoint, Fund, FundAnalysis, FundCatalog, FundSummary,
    NavHistory, RefreshReport,
};
use crate::error::{AppError, Result};
use crate::port::TimeProvider;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, warn};

pub struct TrackerService {
    catalog: Arc<FundCatalog>,
    market: Arc<MarketDataService>,
    settings: AnalysisSettings,
    time_provider: Arc<dyn TimeProvider>,
}

impl TrackerService {
    pub fn new(
        catalog: Arc<FundCatalog>,
        market: Arc<MarketDataService>,
        settings: AnalysisSettings,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            catalog,
            market,
            settings,
            time_provider,
        }
    }

    pub fn list_funds(&self) -> &[Fund] {
        self.catalog.funds()
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Cache TTL the market data is served with (0 = always live)
    pub fn cache_ttl_ms(&self) -> i64 {
        self.market.settings().ttl_ms
    }

    fn resolve(&self, key: &str) -> Result<&Fund> {
        self.catalog
            .find(key)
            .ok_or_else(|| AppError::NotFound(format!("Fund '{}' is not tracked", key)))
    }

    /// Benchmark series, or `None` (logged) when it cannot be loaded
    async fn benchmark_or_none(&self) -> Option<BenchmarkSeries> {
        match self.market.benchmark().await {
            Ok(series) if !series.is_empty() => Some(series),
            Ok(_) => {
                warn!(symbol = %self.settings.benchmark_symbol, "Benchmark series is empty");
                None
            }
            Err(e) => {
                warn!(
                    symbol = %self.settings.benchmark_symbol,
                    error = %e,
                    "Benchmark unavailable"
                );
                None
            }
        }
    }

    /// Summaries for every tracked fund, in catalog order
    ///
    /// A fund whose data cannot be loaded gets an all-`None` summary carrying
    /// the error; it never fails the whole call.
    pub async fn summaries(&self) -> Vec<FundSummary> {
        let today = self.time_provider.today();
        let benchmark = self.benchmark_or_none().await;

        let mut summaries = Vec::with_capacity(self.catalog.len());
        for fund in self.catalog.funds() {
            summaries.push(self.summarize(fund, benchmark.as_ref(), today).await);
        }
        summaries
    }

    /// Summary for a single fund (by name or scheme code)
    pub async fn summary(&self, key: &str) -> Result<FundSummary> {
        let fund = self.resolve(key)?;
        let today = self.time_provider.today();
        let benchmark = self.benchmark_or_none().await;
        Ok(self.summarize(fund, benchmark.as_ref(), today).await)
    }

    async fn summarize(
        &self,
        fund: &Fund,
        benchmark: Option<&BenchmarkSeries>,
        today: NaiveDate,
    ) -> FundSummary {
        let (nifty_cagr_2y, nifty_cagr_5y) = match benchmark {
            Some(series) => (
                cagr_over_window(series.points(), today, SHORT_CAGR_YEARS),
                cagr_over_window(series.points(), today, LONG_CAGR_YEARS),
            ),
            None => (None, None),
        };

        let history = match self.market.nav_history(fund).await {
            Ok(history) => history,
            Err(e) => {
                warn!(fund = %fund.name, error = %e, "NAV history unavailable");
                let mut summary = FundSummary::unavailable(fund.clone(), Some(e.to_string()));
                summary.nifty_cagr_2y = nifty_cagr_2y;
                summary.nifty_cagr_5y = nifty_cagr_5y;
                return summary;
            }
        };

        let mut summary = FundSummary::unavailable(fund.clone(), None);
        summary.nifty_cagr_2y = nifty_cagr_2y;
        summary.nifty_cagr_5y = nifty_cagr_5y;

        let Some((current, high)) = current_and_all_time_high(history.points()) else {
            return summary;
        };

        summary.current_nav = Some(current.nav);
        summary.current_date = Some(current.date);
        summary.max_nav = Some(high.nav);
        summary.max_date = Some(high.date);
        summary.fund_cagr_2y = cagr_over_window(history.points(), today, SHORT_CAGR_YEARS);
        summary.fund_cagr_5y = cagr_over_window(history.points(), today, LONG_CAGR_YEARS);
        summary.buy_alert = is_buy_signal(current.nav, high.nav, self.settings.buy_alert_ratio);

        if summary.buy_alert {
            info!(
                fund = %fund.name,
                current_nav = current.nav,
                all_time_high = high.nav,
                "NAV below buy-alert threshold of all-time high"
            );
        }

        summary
    }

    /// Monthly fund-vs-benchmark table and normalized comparison chart
    pub async fn analysis(&self, key: &str) -> Result<FundAnalysis> {
        let fund = self.resolve(key)?.clone();
        let today = self.time_provider.today();

        let history = self.market.nav_history(&fund).await?;
        let benchmark = self.benchmark_or_none().await;

        Ok(build_analysis(
            fund,
            &history,
            benchmark.as_ref(),
            &self.settings,
            today,
        ))
    }

    /// Force-refresh one fund (or all, when `key` is None) and the benchmark
    pub async fn refresh(&self, key: Option<&str>) -> Result<RefreshReport> {
        match key {
            Some(key) => {
                let fund = self.resolve(key)?.clone();
                Ok(self.market.refresh(std::slice::from_ref(&fund), true).await)
            }
            None => Ok(self.market.refresh(self.catalog.funds(), true).await),
        }
    }
}

/// Assemble rows (newest first, table window only) and chart (oldest first)
pub fn build_analysis(
    fund: Fund,
    history: &NavHistory,
    benchmark: Option<&BenchmarkSeries>,
    settings: &AnalysisSettings,
    today: NaiveDate,
) -> FundAnalysis {
    let samples = monthly_samples(
        history.points(),
        today,
        settings.history_years,
        settings.sample_day,
    );

    let mut warnings = Vec::new();
    if samples.is_empty() {
        warnings.push(WARN_NO_FUND_DATA.to_string());
        return FundAnalysis {
            fund,
            rows: Vec::new(),
            chart: Vec::new(),
            warnings,
        };
    }
    if benchmark.is_none() {
        warnings.push(WARN_NO_BENCHMARK_DATA.to_string());
    }

    let rows = table_rows(&samples, benchmark, settings, today);
    let chart = benchmark
        .map(|series| comparison_chart(&samples, series))
        .unwrap_or_default();

    FundAnalysis {
        fund,
        rows,
        chart,
        warnings,
    }
}

fn table_rows(
    samples: &[MonthlySample],
    benchmark: Option<&BenchmarkSeries>,
    settings: &AnalysisSettings,
    today: NaiveDate,
) -> Vec<AnalysisRow> {
    let bench_changes = benchmark
        .map(|series| {
            let closes: Vec<f64> = series.points().iter().map(|p| p.close).collect();
            pct_change(&closes)
        })
        .unwrap_or_default();

    let table_cutoff = window_cutoff(today, settings.table_years);

    samples
        .iter()
        .rev()
        .filter(|s| s.date > table_cutoff)
        .map(|sample| {
            let nifty_change_pct = benchmark
                .and_then(|series| nearest_index(series.points(), sample.date))
                .and_then(|idx| bench_changes.get(idx).copied().flatten());

            AnalysisRow {
                date: sample.date,
                nav: sample.nav,
                fund_change_pct: sample.change_pct,
                nifty_change_pct,
                underperforming: is_underperforming(
                    sample.change_pct,
                    nifty_change_pct,
                    settings.underperformance_margin_pct,
                ),
            }
        })
        .collect()
}

fn comparison_chart(
    samples: &[MonthlySample],
    benchmark: &BenchmarkSeries,
) -> Vec<ComparisonPoint> {
    let navs: Vec<f64> = samples.iter().map(|s| s.nav).collect();
    let closes: Vec<f64> = samples
        .iter()
        .filter_map(|s| nearest_index(benchmark.points(), s.date))
        .map(|idx| benchmark.points()[idx].close)
        .collect();

    let fund_norm = normalize(&navs);
    let nifty_norm = normalize(&closes);
    if fund_norm.len() != samples.len() || nifty_norm.len() != samples.len() {
        return Vec::new();
    }

    samples
        .iter()
        .zip(fund_norm)
        .zip(nifty_norm)
        .map(|((sample, fund_norm), nifty_norm)| ComparisonPoint {
            date: sample.date,
            fund_norm,
            nifty_norm,
        })
        .collect()
}
