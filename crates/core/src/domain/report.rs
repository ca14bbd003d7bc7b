// Report Models (returned to API consumers)

use crate::domain::fund::Fund;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Per-fund headline numbers (current, ATH, CAGR, buy alert)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundSummary {
    pub fund: Fund,
    pub current_nav: Option<f64>,
    pub current_date: Option<NaiveDate>,
    pub max_nav: Option<f64>,
    pub max_date: Option<NaiveDate>,
    pub fund_cagr_2y: Option<f64>,
    pub fund_cagr_5y: Option<f64>,
    pub nifty_cagr_2y: Option<f64>,
    pub nifty_cagr_5y: Option<f64>,
    /// Current NAV sits below the configured fraction of the ATH
    pub buy_alert: bool,
    /// Set when the fund history could not be loaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FundSummary {
    /// Summary with every figure missing
    pub fn unavailable(fund: Fund, error: Option<String>) -> Self {
        Self {
            fund,
            current_nav: None,
            current_date: None,
            max_nav: None,
            max_date: None,
            fund_cagr_2y: None,
            fund_cagr_5y: None,
            nifty_cagr_2y: None,
            nifty_cagr_5y: None,
            buy_alert: false,
            error,
        }
    }
}

/// One monthly row of the fund-vs-benchmark table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRow {
    pub date: NaiveDate,
    pub nav: f64,
    pub fund_change_pct: Option<f64>,
    pub nifty_change_pct: Option<f64>,
    pub underperforming: bool,
}

/// Point of the normalized (base 100) comparison chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonPoint {
    pub date: NaiveDate,
    pub fund_norm: f64,
    pub nifty_norm: f64,
}

/// Table rows (newest first) and chart series (oldest first) for one fund
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundAnalysis {
    pub fund: Fund,
    pub rows: Vec<AnalysisRow>,
    pub chart: Vec<ComparisonPoint>,
    pub warnings: Vec<String>,
}

/// Outcome of a forced cache refresh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshReport {
    pub run_id: String,
    pub started_at: i64,
    pub finished_at: i64,
    pub refreshed: Vec<String>,
    pub failed: Vec<RefreshFailure>,
}

impl RefreshReport {
    pub fn duration_ms(&self) -> i64 {
        self.finished_at - self.started_at
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshFailure {
    pub key: String,
    pub error: String,
}
