// History Cache Port (Interface)

use crate::domain::{BenchmarkSeries, NavHistory, RefreshReport, SchemeCode};
use crate::error::Result;
use async_trait::async_trait;

/// A cached value together with its fetch time (epoch ms)
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub value: T,
    pub fetched_at: i64,
}

impl<T> Cached<T> {
    pub fn new(value: T, fetched_at: i64) -> Self {
        Self { value, fetched_at }
    }

    /// Fresh while `now - fetched_at < ttl_ms`; a zero TTL is never fresh
    pub fn is_fresh(&self, now_millis: i64, ttl_ms: i64) -> bool {
        ttl_ms > 0 && now_millis - self.fetched_at < ttl_ms
    }
}

/// Persistent cache for upstream market data
#[async_trait]
pub trait HistoryCache: Send + Sync {
    /// Load the cached NAV history of a scheme
    async fn load_nav(&self, code: &SchemeCode) -> Result<Option<Cached<NavHistory>>>;

    /// Insert or replace the NAV history of a scheme
    async fn store_nav(&self, history: &NavHistory, fetched_at: i64) -> Result<()>;

    /// Load the cached benchmark series
    async fn load_benchmark(&self, symbol: &str) -> Result<Option<Cached<BenchmarkSeries>>>;

    /// Insert or replace a benchmark series
    async fn store_benchmark(&self, series: &BenchmarkSeries, fetched_at: i64) -> Result<()>;

    /// Persist the outcome of a refresh run
    async fn record_refresh(&self, report: &RefreshReport) -> Result<()>;

    /// Most recent refresh run, if any
    async fn last_refresh(&self) -> Result<Option<RefreshReport>>;

    /// Number of cached NAV histories + benchmark series
    async fn entry_count(&self) -> Result<i64>;
}

/// In-memory cache for tests
pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct InMemoryHistoryCache {
        navs: Mutex<HashMap<SchemeCode, Cached<NavHistory>>>,
        benchmarks: Mutex<HashMap<String, Cached<BenchmarkSeries>>>,
        runs: Mutex<Vec<RefreshReport>>,
    }

    impl InMemoryHistoryCache {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn refresh_runs(&self) -> Vec<RefreshReport> {
            self.runs.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HistoryCache for InMemoryHistoryCache {
        async fn load_nav(&self, code: &SchemeCode) -> Result<Option<Cached<NavHistory>>> {
            Ok(self.navs.lock().unwrap().get(code).cloned())
        }

        async fn store_nav(&self, history: &NavHistory, fetched_at: i64) -> Result<()> {
            self.navs
                .lock()
                .unwrap()
                .insert(history.code.clone(), Cached::new(history.clone(), fetched_at));
            Ok(())
        }

        async fn load_benchmark(&self, symbol: &str) -> Result<Option<Cached<BenchmarkSeries>>> {
            Ok(self.benchmarks.lock().unwrap().get(symbol).cloned())
        }

        async fn store_benchmark(&self, series: &BenchmarkSeries, fetched_at: i64) -> Result<()> {
            self.benchmarks
                .lock()
                .unwrap()
                .insert(series.symbol.clone(), Cached::new(series.clone(), fetched_at));
            Ok(())
        }

        async fn record_refresh(&self, report: &RefreshReport) -> Result<()> {
            self.runs.lock().unwrap().push(report.clone());
            Ok(())
        }

        async fn last_refresh(&self) -> Result<Option<RefreshReport>> {
            Ok(self.runs.lock().unwrap().last().cloned())
        }

        async fn entry_count(&self) -> Result<i64> {
            let navs = self.navs.lock().unwrap().len();
            let benchmarks = self.benchmarks.lock().unwrap().len();
            Ok((navs + benchmarks) as i64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freshness() {
        let cached = Cached::new((), 1_000);
        assert!(cached.is_fresh(1_500, 1_000));
        assert!(!cached.is_fresh(2_000, 1_000));
        assert!(!cached.is_fresh(1_001, 0));
    }
}
