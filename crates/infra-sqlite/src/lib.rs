// navtrack Infrastructure - SQLite Adapter
// Implements: HistoryCache, Maintenance

mod connection;
mod error;
mod history_cache;
mod maintenance_impl;
mod migration;

pub use connection::create_pool;
pub use history_cache::SqliteHistoryCache;
pub use maintenance_impl::SqliteMaintenance;
pub use migration::{current_version, run_migrations};
