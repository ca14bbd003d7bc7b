// Port Layer - Interfaces for external dependencies

pub mod history_cache;
pub mod id_provider; // For deterministic testing
pub mod maintenance;
pub mod source;
pub mod time_provider;

// Re-exports
pub use history_cache::{Cached, HistoryCache};
pub use id_provider::IdProvider;
pub use maintenance::{Maintenance, MaintenanceConfig, MaintenanceStats, PurgeStats};
pub use source::{BenchmarkSource, NavSource, SourceError, SourceResult};
pub use time_provider::TimeProvider;
