// navtrack Infrastructure - HTTP Adapters
// Implements: NavSource (mfapi.in), BenchmarkSource (Yahoo chart API)

mod client;
mod mfapi;
mod yahoo;

pub use client::HttpSettings;
pub use mfapi::{parse_history_body, MfApiClient};
pub use yahoo::{parse_chart_body, YahooChartClient};
