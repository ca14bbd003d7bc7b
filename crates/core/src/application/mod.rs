// Application Layer - Use Cases and Business Logic

pub mod analytics;
pub mod constants;
pub mod maintenance;
pub mod market_data;
pub mod refresh;
pub mod retry;
pub mod settings;
pub mod shutdown;
pub mod tracker;

// Re-exports
pub use maintenance::MaintenanceScheduler;
pub use market_data::{CacheSettings, MarketDataService};
pub use refresh::RefreshScheduler;
pub use retry::{RetryDecision, RetryPolicy};
pub use settings::AnalysisSettings;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
pub use tracker::TrackerService;
