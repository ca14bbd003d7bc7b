// Market Data Service - cache-through access to NAV and benchmark data

use crate::application::analytics::window_cutoff;
use crate::application::constants::DEFAULT_CACHE_TTL_HOURS;
use crate::application::retry::RetryPolicy;
use crate::domain::{BenchmarkSeries, Fund, NavHistory, RefreshFailure, RefreshReport};
use crate::error::Result;
use crate::port::{BenchmarkSource, Cached, HistoryCache, IdProvider, NavSource, TimeProvider};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Cache behaviour of `MarketDataService`
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Entries younger than this are served without contacting the source.
    /// Zero disables the cache for reads (always live).
    pub ttl_ms: i64,

    /// Benchmark ticker to load
    pub benchmark_symbol: String,

    /// Years of benchmark history to request
    pub benchmark_years: u32,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_ms: (DEFAULT_CACHE_TTL_HOURS * 60 * 60 * 1000) as i64,
            benchmark_symbol: crate::domain::benchmark::NIFTY_50_SYMBOL.to_string(),
            benchmark_years: 5,
        }
    }
}

/// Reads through the `HistoryCache`, falling back to the upstream sources.
///
/// A failed fetch is served from a stale cache entry when one exists, so an
/// upstream outage degrades to old data instead of an error.
pub struct MarketDataService {
    nav_source: Arc<dyn NavSource>,
    benchmark_source: Arc<dyn BenchmarkSource>,
    cache: Arc<dyn HistoryCache>,
    time_provider: Arc<dyn TimeProvider>,
    id_provider: Arc<dyn IdProvider>,
    retry_policy: RetryPolicy,
    settings: CacheSettings,
}

impl MarketDataService {
    pub fn new(
        nav_source: Arc<dyn NavSource>,
        benchmark_source: Arc<dyn BenchmarkSource>,
        cache: Arc<dyn HistoryCache>,
        time_provider: Arc<dyn TimeProvider>,
        id_provider: Arc<dyn IdProvider>,
        retry_policy: RetryPolicy,
        settings: CacheSettings,
    ) -> Self {
        Self {
            nav_source,
            benchmark_source,
            cache,
            time_provider,
            id_provider,
            retry_policy,
            settings,
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// NAV history of a fund (ascending)
    pub async fn nav_history(&self, fund: &Fund) -> Result<NavHistory> {
        let now = self.time_provider.now_millis();
        let cached = self.cached_nav(fund).await;

        if let Some(entry) = &cached {
            if entry.is_fresh(now, self.settings.ttl_ms) {
                debug!(fund = %fund.name, code = %fund.code, "NAV cache hit");
                return Ok(entry.value.clone());
            }
        }

        match self.fetch_nav(fund).await {
            Ok(history) => Ok(history),
            Err(err) => match cached {
                Some(stale) => {
                    warn!(
                        fund = %fund.name,
                        code = %fund.code,
                        age_ms = now - stale.fetched_at,
                        error = %err,
                        "NAV fetch failed, serving stale cache entry"
                    );
                    Ok(stale.value)
                }
                None => Err(err),
            },
        }
    }

    /// Benchmark monthly closes for the configured window (ascending)
    pub async fn benchmark(&self) -> Result<BenchmarkSeries> {
        let symbol = &self.settings.benchmark_symbol;
        let now = self.time_provider.now_millis();
        let cached = self.cached_benchmark().await;

        if let Some(entry) = &cached {
            if entry.is_fresh(now, self.settings.ttl_ms) {
                debug!(symbol = %symbol, "Benchmark cache hit");
                return Ok(entry.value.clone());
            }
        }

        match self.fetch_benchmark().await {
            Ok(series) => Ok(series),
            Err(err) => match cached {
                Some(stale) => {
                    warn!(
                        symbol = %symbol,
                        age_ms = now - stale.fetched_at,
                        error = %err,
                        "Benchmark fetch failed, serving stale cache entry"
                    );
                    Ok(stale.value)
                }
                None => Err(err),
            },
        }
    }

    /// Force-fetch the given funds and the benchmark, overwriting the cache
    pub async fn refresh(&self, funds: &[Fund], include_benchmark: bool) -> RefreshReport {
        let run_id = self.id_provider.generate_id();
        let started_at = self.time_provider.now_millis();
        info!(run_id = %run_id, funds = funds.len(), "Refresh started");

        let results = futures::future::join_all(funds.iter().map(|fund| async move {
            (fund, self.fetch_nav(fund).await)
        }))
        .await;

        let mut refreshed = Vec::new();
        let mut failed = Vec::new();

        for (fund, result) in results {
            match result {
                Ok(_) => refreshed.push(fund.code.to_string()),
                Err(err) => failed.push(RefreshFailure {
                    key: fund.code.to_string(),
                    error: err.to_string(),
                }),
            }
        }

        if include_benchmark {
            let symbol = self.settings.benchmark_symbol.clone();
            match self.fetch_benchmark().await {
                Ok(_) => refreshed.push(symbol),
                Err(err) => failed.push(RefreshFailure {
                    key: symbol,
                    error: err.to_string(),
                }),
            }
        }

        let report = RefreshReport {
            run_id,
            started_at,
            finished_at: self.time_provider.now_millis(),
            refreshed,
            failed,
        };

        if let Err(e) = self.cache.record_refresh(&report).await {
            warn!(run_id = %report.run_id, error = %e, "Failed to record refresh run");
        }

        info!(
            run_id = %report.run_id,
            refreshed = report.refreshed.len(),
            failed = report.failed.len(),
            duration_ms = report.duration_ms(),
            "Refresh finished"
        );

        report
    }

    async fn cached_nav(&self, fund: &Fund) -> Option<Cached<NavHistory>> {
        // A broken cache must not take reads down with it
        match self.cache.load_nav(&fund.code).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(code = %fund.code, error = %e, "NAV cache read failed");
                None
            }
        }
    }

    async fn cached_benchmark(&self) -> Option<Cached<BenchmarkSeries>> {
        match self.cache.load_benchmark(&self.settings.benchmark_symbol).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(
                    symbol = %self.settings.benchmark_symbol,
                    error = %e,
                    "Benchmark cache read failed"
                );
                None
            }
        }
    }

    async fn fetch_nav(&self, fund: &Fund) -> Result<NavHistory> {
        let history = self
            .retry_policy
            .run(fund.code.as_str(), || self.nav_source.fetch_history(&fund.code))
            .await?;

        info!(
            fund = %fund.name,
            code = %fund.code,
            points = history.len(),
            "Fetched NAV history"
        );

        if let Err(e) = self
            .cache
            .store_nav(&history, self.time_provider.now_millis())
            .await
        {
            warn!(code = %fund.code, error = %e, "NAV cache write failed");
        }

        Ok(history)
    }

    async fn fetch_benchmark(&self) -> Result<BenchmarkSeries> {
        let symbol = self.settings.benchmark_symbol.as_str();
        let end = self.time_provider.today();
        let start = window_cutoff(end, self.settings.benchmark_years);

        let series = self
            .retry_policy
            .run(symbol, || self.benchmark_source.fetch_monthly(symbol, start, end))
            .await?;

        info!(symbol = %symbol, points = series.len(), "Fetched benchmark series");

        if let Err(e) = self
            .cache
            .store_benchmark(&series, self.time_provider.now_millis())
            .await
        {
            warn!(symbol = %symbol, error = %e, "Benchmark cache write failed");
        }

        Ok(series)
    }
}
