// Market Data Source Ports (Interfaces)

use crate::domain::{BenchmarkSeries, NavHistory, SchemeCode};
use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

/// Upstream data source failure
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Unexpected status {code}: {message}")]
    Status { code: u16, message: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl SourceError {
    /// Transient errors are worth retrying (network, timeouts, 5xx, 429)
    pub fn is_transient(&self) -> bool {
        match self {
            SourceError::Http(_) | SourceError::Timeout(_) => true,
            SourceError::Status { code, .. } => *code == 429 || *code >= 500,
            SourceError::Parse(_) | SourceError::NotFound(_) => false,
        }
    }
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Provider of published fund NAV history
#[async_trait]
pub trait NavSource: Send + Sync {
    /// Fetch the full NAV history of a scheme (ascending by date)
    ///
    /// An unknown scheme with no published data yields an empty history.
    async fn fetch_history(&self, code: &SchemeCode) -> SourceResult<NavHistory>;
}

/// Provider of benchmark index prices
#[async_trait]
pub trait BenchmarkSource: Send + Sync {
    /// Fetch monthly closes for `symbol` between `start` and `end` (inclusive)
    async fn fetch_monthly(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> SourceResult<BenchmarkSeries>;
}

/// In-memory sources for tests
pub mod mocks {
    use super::*;
    use crate::domain::{BenchmarkPoint, NavPoint};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Mock NavSource serving canned histories
    #[derive(Default)]
    pub struct MockNavSource {
        histories: Arc<Mutex<HashMap<SchemeCode, NavHistory>>>,
        failure: Arc<Mutex<Option<SourceError>>>,
        call_count: Arc<Mutex<usize>>,
    }

    impl MockNavSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_history(self, code: &SchemeCode, points: Vec<NavPoint>) -> Self {
            self.set_history(code, points);
            self
        }

        pub fn set_history(&self, code: &SchemeCode, points: Vec<NavPoint>) {
            self.histories
                .lock()
                .unwrap()
                .insert(code.clone(), NavHistory::new(code.clone(), points));
        }

        /// Make every subsequent call fail (None restores normal behaviour)
        pub fn set_failure(&self, failure: Option<SourceError>) {
            *self.failure.lock().unwrap() = failure;
        }

        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl NavSource for MockNavSource {
        async fn fetch_history(&self, code: &SchemeCode) -> SourceResult<NavHistory> {
            *self.call_count.lock().unwrap() += 1;
            if let Some(err) = self.failure.lock().unwrap().clone() {
                return Err(err);
            }
            Ok(self
                .histories
                .lock()
                .unwrap()
                .get(code)
                .cloned()
                .unwrap_or_else(|| NavHistory::empty(code.clone())))
        }
    }

    /// Mock BenchmarkSource serving one canned series
    #[derive(Default)]
    pub struct MockBenchmarkSource {
        points: Arc<Mutex<Vec<BenchmarkPoint>>>,
        failure: Arc<Mutex<Option<SourceError>>>,
        call_count: Arc<Mutex<usize>>,
    }

    impl MockBenchmarkSource {
        pub fn new(points: Vec<BenchmarkPoint>) -> Self {
            Self {
                points: Arc::new(Mutex::new(points)),
                ..Default::default()
            }
        }

        pub fn set_failure(&self, failure: Option<SourceError>) {
            *self.failure.lock().unwrap() = failure;
        }

        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl BenchmarkSource for MockBenchmarkSource {
        async fn fetch_monthly(
            &self,
            symbol: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> SourceResult<BenchmarkSeries> {
            *self.call_count.lock().unwrap() += 1;
            if let Some(err) = self.failure.lock().unwrap().clone() {
                return Err(err);
            }
            let points = self
                .points
                .lock()
                .unwrap()
                .iter()
                .filter(|p| p.date >= start && p.date <= end)
                .copied()
                .collect();
            Ok(BenchmarkSeries::new(symbol, points))
        }
    }
}
