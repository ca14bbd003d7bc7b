// Analysis settings (thresholds and windows)

use crate::application::constants::MAX_WINDOW_YEARS;
use crate::domain::benchmark::NIFTY_50_SYMBOL;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// Tunables for the tracker analytics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Window of history used for samples and the chart (years)
    pub history_years: u32,

    /// Window shown in the analysis table (years)
    pub table_years: u32,

    /// Day of month whose NAV represents the month
    pub sample_day: u32,

    /// Buy alert fires when current NAV < ratio * all-time high
    pub buy_alert_ratio: f64,

    /// Row flagged when fund change < benchmark change - margin (percentage points)
    pub underperformance_margin_pct: f64,

    /// Benchmark ticker on the benchmark source
    pub benchmark_symbol: String,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            history_years: 5,
            table_years: 2,
            sample_day: 3,
            buy_alert_ratio: 0.80,
            underperformance_margin_pct: 3.0,
            benchmark_symbol: NIFTY_50_SYMBOL.to_string(),
        }
    }
}

impl AnalysisSettings {
    pub fn validate(&self) -> Result<()> {
        if self.history_years == 0 || self.table_years == 0 {
            return Err(AppError::Config(
                "history_years and table_years must be at least 1".to_string(),
            ));
        }
        if self.history_years > MAX_WINDOW_YEARS {
            return Err(AppError::Config(format!(
                "history_years must be at most {}, got {}",
                MAX_WINDOW_YEARS, self.history_years
            )));
        }
        if self.table_years > self.history_years {
            return Err(AppError::Config(format!(
                "table_years ({}) cannot exceed history_years ({})",
                self.table_years, self.history_years
            )));
        }
        // Day 29+ does not exist in every month
        if !(1..=28).contains(&self.sample_day) {
            return Err(AppError::Config(format!(
                "sample_day must be in 1..=28, got {}",
                self.sample_day
            )));
        }
        if !(self.buy_alert_ratio > 0.0 && self.buy_alert_ratio <= 1.0) {
            return Err(AppError::Config(format!(
                "buy_alert_ratio must be in (0, 1], got {}",
                self.buy_alert_ratio
            )));
        }
        if !(self.underperformance_margin_pct >= 0.0) {
            return Err(AppError::Config(format!(
                "underperformance_margin_pct must be >= 0, got {}",
                self.underperformance_margin_pct
            )));
        }
        if self.benchmark_symbol.trim().is_empty() {
            return Err(AppError::Config(
                "benchmark_symbol cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
