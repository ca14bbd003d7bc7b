//! RPC Method Handlers

use crate::error::{throttled, to_rpc_error};
use crate::rate_limiter::RateLimiter;
use crate::types::{
    ChartResponse, FundRequest, FundsListRequest, FundsListResponse, MaintenanceRequest,
    MaintenanceResponse, RefreshRequest, StatsRequest, StatsResponse, SummaryRequest,
    SummaryResponse,
};
use jsonrpsee::types::ErrorObjectOwned;
use navtrack_core::application::TrackerService;
use navtrack_core::domain::{FundAnalysis, RefreshReport};
use navtrack_core::port::{HistoryCache, Maintenance, MaintenanceConfig};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    tracker: Arc<TrackerService>,
    cache: Arc<dyn HistoryCache>,
    maintenance: Arc<dyn Maintenance>,
    maintenance_config: MaintenanceConfig,
    refresh_limiter: RateLimiter,
    start_time: Instant,
}

impl RpcHandler {
    pub fn new(
        tracker: Arc<TrackerService>,
        cache: Arc<dyn HistoryCache>,
        maintenance: Arc<dyn Maintenance>,
        maintenance_config: MaintenanceConfig,
        refresh_limiter: RateLimiter,
    ) -> Self {
        Self {
            tracker,
            cache,
            maintenance,
            maintenance_config,
            refresh_limiter,
            start_time: Instant::now(),
        }
    }

    /// funds.list.v1
    pub async fn funds_list(
        &self,
        _params: FundsListRequest,
    ) -> Result<FundsListResponse, ErrorObjectOwned> {
        Ok(FundsListResponse {
            funds: self.tracker.list_funds().to_vec(),
        })
    }

    /// fund.summary.v1
    pub async fn summary(
        &self,
        params: SummaryRequest,
    ) -> Result<SummaryResponse, ErrorObjectOwned> {
        let summaries = match params.fund.as_deref() {
            Some(fund) => vec![self.tracker.summary(fund).await.map_err(to_rpc_error)?],
            None => self.tracker.summaries().await,
        };
        Ok(SummaryResponse { summaries })
    }

    /// fund.analysis.v1
    pub async fn analysis(&self, params: FundRequest) -> Result<FundAnalysis, ErrorObjectOwned> {
        self.tracker.analysis(&params.fund).await.map_err(to_rpc_error)
    }

    /// fund.chart.v1
    pub async fn chart(&self, params: FundRequest) -> Result<ChartResponse, ErrorObjectOwned> {
        let analysis = self.tracker.analysis(&params.fund).await.map_err(to_rpc_error)?;
        Ok(ChartResponse {
            fund: analysis.fund,
            points: analysis.chart,
            warnings: analysis.warnings,
        })
    }

    /// cache.refresh.v1 (rate limited: every call hits the upstream sources)
    pub async fn refresh(&self, params: RefreshRequest) -> Result<RefreshReport, ErrorObjectOwned> {
        if !self.refresh_limiter.check() {
            return Err(throttled());
        }

        self.tracker
            .refresh(params.fund.as_deref())
            .await
            .map_err(to_rpc_error)
    }

    /// admin.stats.v1
    pub async fn stats(&self, _params: StatsRequest) -> Result<StatsResponse, ErrorObjectOwned> {
        let stats = self.maintenance.get_stats().await.map_err(to_rpc_error)?;
        let cache_entries = self.cache.entry_count().await.map_err(to_rpc_error)?;
        let last_refresh = self.cache.last_refresh().await.map_err(to_rpc_error)?;

        Ok(StatsResponse {
            version: navtrack_core::VERSION.to_string(),
            fund_count: self.tracker.list_funds().len(),
            cache_entries,
            nav_entries: stats.nav_entries,
            benchmark_entries: stats.benchmark_entries,
            refresh_runs: stats.refresh_runs,
            db_size_bytes: stats.db_size_bytes,
            fragmentation_percent: stats.fragmentation_percent,
            cache_ttl_hours: self.tracker.cache_ttl_ms() as f64 / 3_600_000.0,
            last_refresh,
            uptime_seconds: self.start_time.elapsed().as_secs() as i64,
        })
    }

    /// admin.maintenance.v1
    pub async fn maintenance(
        &self,
        params: MaintenanceRequest,
    ) -> Result<MaintenanceResponse, ErrorObjectOwned> {
        let stats_before = self.maintenance.get_stats().await.map_err(to_rpc_error)?;

        let purged = self
            .maintenance
            .purge_stale(self.maintenance_config.retention_days)
            .await
            .map_err(to_rpc_error)?;

        let vacuum_run =
            params.force_vacuum || stats_before.db_size_mb > self.maintenance_config.max_db_size_mb;
        let reclaimed_mb = if vacuum_run {
            self.maintenance.vacuum().await.map_err(to_rpc_error)?
        } else {
            0.0
        };

        let stats_after = self.maintenance.get_stats().await.map_err(to_rpc_error)?;

        info!(
            vacuum_run = vacuum_run,
            entries_purged = purged.entries_purged,
            runs_purged = purged.runs_purged,
            "Manual maintenance completed"
        );

        Ok(MaintenanceResponse {
            vacuum_run,
            reclaimed_mb,
            entries_purged: purged.entries_purged,
            runs_purged: purged.runs_purged,
            db_size_before: stats_before.db_size_bytes,
            db_size_after: stats_after.db_size_bytes,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::code;
    use chrono::NaiveDate;
    use navtrack_core::application::{CacheSettings, MarketDataService, RetryPolicy};
    use navtrack_core::domain::{BenchmarkPoint, Fund, FundCatalog, NavPoint, SchemeCode};
    use navtrack_core::port::history_cache::mocks::InMemoryHistoryCache;
    use navtrack_core::port::id_provider::mocks::SequenceIdProvider;
    use navtrack_core::port::source::mocks::{MockBenchmarkSource, MockNavSource};
    use navtrack_core::port::time_provider::FixedTimeProvider;
    use stubs::StubMaintenance;

    mod stubs {
        use navtrack_core::error::Result;
        use navtrack_core::port::{Maintenance, MaintenanceStats, PurgeStats};

        /// Maintenance stub reporting a fixed, tiny database
        pub struct StubMaintenance;

        #[async_trait::async_trait]
        impl Maintenance for StubMaintenance {
            async fn vacuum(&self) -> Result<f64> {
                Ok(0.5)
            }

            async fn purge_stale(&self, _retention_days: i64) -> Result<PurgeStats> {
                Ok(PurgeStats {
                    entries_purged: 2,
                    runs_purged: 1,
                })
            }

            async fn get_stats(&self) -> Result<MaintenanceStats> {
                Ok(MaintenanceStats {
                    db_size_mb: 1.0,
                    db_size_bytes: 1024 * 1024,
                    nav_entries: 3,
                    benchmark_entries: 1,
                    refresh_runs: 4,
                    fragmentation_percent: 0.0,
                })
            }
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    pub(crate) fn test_handler(limiter: RateLimiter) -> RpcHandler {
        let code = SchemeCode::new("122639").unwrap();
        let catalog =
            FundCatalog::new(vec![Fund::new("Parag Parikh Flexi Cap", code.clone())]).unwrap();

        let nav_source = MockNavSource::new().with_history(
            &code,
            vec![
                NavPoint::new(d(2024, 11, 3), 80.0),
                NavPoint::new(d(2024, 12, 3), 84.0),
                NavPoint::new(d(2025, 1, 3), 79.8),
            ],
        );
        let benchmark_source = MockBenchmarkSource::new(vec![
            BenchmarkPoint::new(d(2024, 11, 1), 24000.0),
            BenchmarkPoint::new(d(2024, 12, 1), 24480.0),
            BenchmarkPoint::new(d(2025, 1, 1), 23500.0),
        ]);
        let cache = Arc::new(InMemoryHistoryCache::new());
        let time_provider = Arc::new(FixedTimeProvider::at_date(d(2025, 1, 10)));

        let market = Arc::new(MarketDataService::new(
            Arc::new(nav_source),
            Arc::new(benchmark_source),
            cache.clone(),
            time_provider.clone(),
            Arc::new(SequenceIdProvider::default()),
            RetryPolicy::new(1, 1),
            CacheSettings::default(),
        ));
        let tracker = Arc::new(TrackerService::new(
            Arc::new(catalog),
            market,
            Default::default(),
            time_provider,
        ));

        RpcHandler::new(
            tracker,
            cache,
            Arc::new(StubMaintenance),
            MaintenanceConfig::default(),
            limiter,
        )
    }

    #[tokio::test]
    async fn test_funds_list() {
        let handler = test_handler(RateLimiter::new(1, 1.0));
        let response = handler.funds_list(FundsListRequest {}).await.unwrap();
        assert_eq!(response.funds.len(), 1);
        assert_eq!(response.funds[0].code.as_str(), "122639");
    }

    #[tokio::test]
    async fn test_summary_all_and_single() {
        let handler = test_handler(RateLimiter::new(1, 1.0));

        let all = handler.summary(SummaryRequest::default()).await.unwrap();
        assert_eq!(all.summaries.len(), 1);
        assert_eq!(all.summaries[0].current_nav, Some(79.8));

        let single = handler
            .summary(SummaryRequest {
                fund: Some("parag parikh flexi cap".into()),
            })
            .await
            .unwrap();
        assert_eq!(single.summaries[0].max_nav, Some(84.0));

        let err = handler
            .summary(SummaryRequest {
                fund: Some("Axis Bluechip".into()),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), code::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_chart_and_analysis() {
        let handler = test_handler(RateLimiter::new(1, 1.0));

        let analysis = handler
            .analysis(FundRequest {
                fund: "122639".into(),
            })
            .await
            .unwrap();
        assert_eq!(analysis.rows.len(), 3);
        assert_eq!(analysis.rows[0].date, d(2025, 1, 3));

        let chart = handler
            .chart(FundRequest {
                fund: "122639".into(),
            })
            .await
            .unwrap();
        assert_eq!(chart.points.len(), 3);
        assert_eq!(chart.points[0].fund_norm, 100.0);
        assert_eq!(chart.points[0].nifty_norm, 100.0);
    }

    #[tokio::test]
    async fn test_refresh_is_rate_limited() {
        let handler = test_handler(RateLimiter::new(1, 0.0));

        let report = handler.refresh(RefreshRequest::default()).await.unwrap();
        assert_eq!(report.refreshed, vec!["122639".to_string(), "^NSEI".to_string()]);

        let err = handler.refresh(RefreshRequest::default()).await.unwrap_err();
        assert_eq!(err.code(), code::THROTTLED);
    }

    #[tokio::test]
    async fn test_stats_include_last_refresh() {
        let handler = test_handler(RateLimiter::new(1, 1.0));
        handler.refresh(RefreshRequest::default()).await.unwrap();

        let stats = handler.stats(StatsRequest {}).await.unwrap();
        assert_eq!(stats.fund_count, 1);
        assert_eq!(stats.cache_entries, 2);
        assert_eq!(stats.cache_ttl_hours, 24.0);
        assert_eq!(stats.last_refresh.unwrap().run_id, "run-1");
    }

    #[tokio::test]
    async fn test_maintenance_vacuum_only_when_forced_or_oversized() {
        let handler = test_handler(RateLimiter::new(1, 1.0));

        let response = handler.maintenance(MaintenanceRequest::default()).await.unwrap();
        assert!(!response.vacuum_run);
        assert_eq!(response.reclaimed_mb, 0.0);
        assert_eq!(response.entries_purged, 2);

        let response = handler
            .maintenance(MaintenanceRequest { force_vacuum: true })
            .await
            .unwrap();
        assert!(response.vacuum_run);
        assert_eq!(response.reclaimed_mb, 0.5);
    }
}
