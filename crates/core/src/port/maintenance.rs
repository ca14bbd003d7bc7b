// Cache Maintenance port
use crate::error::Result;
use async_trait::async_trait;

/// Cache database statistics
#[derive(Debug, Clone)]
pub struct MaintenanceStats {
    pub db_size_mb: f64,
    pub db_size_bytes: i64,
    pub nav_entries: i64,
    pub benchmark_entries: i64,
    pub refresh_runs: i64,
    pub fragmentation_percent: f64,
}

/// Result of a purge pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeStats {
    pub entries_purged: i64,
    pub runs_purged: i64,
}

/// Maintenance configuration
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    /// Cache entries / refresh runs older than this are deleted (days)
    pub retention_days: i64,

    /// Maximum DB size before forcing VACUUM (MB)
    pub max_db_size_mb: f64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            retention_days: 30,
            max_db_size_mb: 256.0,
        }
    }
}

/// Cache maintenance operations
#[async_trait]
pub trait Maintenance: Send + Sync {
    /// Run VACUUM; returns space reclaimed in MB
    async fn vacuum(&self) -> Result<f64>;

    /// Delete cache entries and refresh runs not touched within `retention_days`
    async fn purge_stale(&self, retention_days: i64) -> Result<PurgeStats>;

    /// Get maintenance statistics
    async fn get_stats(&self) -> Result<MaintenanceStats>;

    /// Purge, then VACUUM if the database grew past the limit
    async fn run_full_maintenance(&self, config: &MaintenanceConfig) -> Result<MaintenanceStats> {
        let stats_before = self.get_stats().await?;

        let purged = self.purge_stale(config.retention_days).await?;

        let reclaimed_mb = if stats_before.db_size_mb > config.max_db_size_mb {
            self.vacuum().await?
        } else {
            0.0
        };

        let stats_after = self.get_stats().await?;

        tracing::info!(
            entries_purged = purged.entries_purged,
            runs_purged = purged.runs_purged,
            reclaimed_mb = reclaimed_mb,
            db_size_mb = stats_after.db_size_mb,
            "Maintenance completed"
        );

        Ok(stats_after)
    }
}
