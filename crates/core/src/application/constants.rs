// Application constants (no magic values)
use std::time::Duration;

/// Calendar windows are measured in fixed 365-day years
pub const DAYS_PER_YEAR: i64 = 365;

/// Longest history or table window accepted in settings (years)
pub const MAX_WINDOW_YEARS: u32 = 100;

/// Longest scheduler interval accepted in settings (one year, in hours)
pub const MAX_INTERVAL_HOURS: u64 = 365 * 24;

/// Short CAGR horizon reported in summaries (years)
pub const SHORT_CAGR_YEARS: u32 = 2;

/// Long CAGR horizon reported in summaries (years)
pub const LONG_CAGR_YEARS: u32 = 5;

/// Default cache TTL (24h, one NAV publication cycle)
pub const DEFAULT_CACHE_TTL_HOURS: u64 = 24;

/// Default retry base delay for upstream fetches
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;

/// Default attempts per upstream fetch (first try included)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default exponential backoff factor
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// Default refresh interval (24h)
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Warning attached to an analysis when the fund has no NAV rows
pub const WARN_NO_FUND_DATA: &str = "No fund data available";

/// Warning attached to an analysis when the benchmark could not be loaded
pub const WARN_NO_BENCHMARK_DATA: &str = "Nifty data not available";
