//! RPC Request/Response Types
//!
//! Method parameters and results. Report payloads reuse the core domain types.

use navtrack_core::domain::{ComparisonPoint, Fund, FundSummary, RefreshReport};
use serde::{Deserialize, Serialize};

/// funds.list.v1
#[derive(Debug, Default, Deserialize)]
pub struct FundsListRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundsListResponse {
    pub funds: Vec<Fund>,
}

/// fund.summary.v1 - all funds when `fund` is omitted
#[derive(Debug, Default, Deserialize)]
pub struct SummaryRequest {
    #[serde(default)]
    pub fund: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summaries: Vec<FundSummary>,
}

/// fund.analysis.v1 / fund.chart.v1 - fund name or scheme code
#[derive(Debug, Deserialize)]
pub struct FundRequest {
    pub fund: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartResponse {
    pub fund: Fund,
    pub points: Vec<ComparisonPoint>,
    pub warnings: Vec<String>,
}

/// cache.refresh.v1 - every fund plus the benchmark when `fund` is omitted
#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub fund: Option<String>,
}

/// admin.stats.v1
#[derive(Debug, Default, Deserialize)]
pub struct StatsRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub version: String,
    pub fund_count: usize,
    pub cache_entries: i64,
    pub nav_entries: i64,
    pub benchmark_entries: i64,
    pub refresh_runs: i64,
    pub db_size_bytes: i64,
    pub fragmentation_percent: f64,
    pub cache_ttl_hours: f64,
    pub last_refresh: Option<RefreshReport>,
    pub uptime_seconds: i64,
}

/// admin.maintenance.v1
#[derive(Debug, Default, Deserialize)]
pub struct MaintenanceRequest {
    #[serde(default)]
    pub force_vacuum: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceResponse {
    pub vacuum_run: bool,
    pub reclaimed_mb: f64,
    pub entries_purged: i64,
    pub runs_purged: i64,
    pub db_size_before: i64,
    pub db_size_after: i64,
}
