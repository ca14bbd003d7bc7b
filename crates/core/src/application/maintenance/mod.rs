// Maintenance Service
// Scheduled cache maintenance (purge stale entries, VACUUM)

use crate::application::shutdown::ShutdownToken;
use crate::error::Result;
use crate::port::{Maintenance, MaintenanceConfig, MaintenanceStats};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant};
use tracing::{error, info};

/// Maintenance scheduler
///
/// Runs periodic maintenance operations in the background
pub struct MaintenanceScheduler {
    maintenance: Arc<dyn Maintenance>,
    config: MaintenanceConfig,
    interval_hours: u64,
}

impl MaintenanceScheduler {
    /// Create a new maintenance scheduler
    ///
    /// # Arguments
    /// * `maintenance` - Maintenance implementation
    /// * `config` - Maintenance configuration
    /// * `interval_hours` - How often to run maintenance (hours)
    pub fn new(
        maintenance: Arc<dyn Maintenance>,
        config: MaintenanceConfig,
        interval_hours: u64,
    ) -> Self {
        Self {
            maintenance,
            config,
            interval_hours: interval_hours.max(1),
        }
    }

    /// Run maintenance loop until shutdown
    ///
    /// The first pass runs one interval after startup.
    pub async fn run(self, mut shutdown: ShutdownToken) {
        info!(
            interval_hours = self.interval_hours,
            retention_days = self.config.retention_days,
            "Maintenance scheduler started"
        );

        let period = Duration::from_secs(self.interval_hours * 3600);
        let mut tick = interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    info!("Running scheduled maintenance...");
                    match self.maintenance.run_full_maintenance(&self.config).await {
                        Ok(stats) => {
                            info!(
                                db_size_mb = stats.db_size_mb,
                                nav_entries = stats.nav_entries,
                                benchmark_entries = stats.benchmark_entries,
                                refresh_runs = stats.refresh_runs,
                                "Scheduled maintenance completed successfully"
                            );
                        }
                        Err(e) => {
                            error!(error = ?e, "Scheduled maintenance failed");
                        }
                    }
                }
                _ = shutdown.wait() => {
                    info!("Maintenance scheduler shutting down");
                    break;
                }
            }
        }
    }

    /// Run maintenance immediately (for manual trigger)
    pub async fn run_now(&self) -> Result<MaintenanceStats> {
        info!("Running manual maintenance...");

        let stats = self.maintenance.run_full_maintenance(&self.config).await?;

        info!(
            db_size_mb = stats.db_size_mb,
            nav_entries = stats.nav_entries,
            "Manual maintenance completed"
        );

        Ok(stats)
    }
}
