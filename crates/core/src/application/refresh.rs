// Refresh Scheduler - keeps the cache warm in the background

use crate::application::shutdown::ShutdownToken;
use crate::application::tracker::TrackerService;
use crate::domain::RefreshReport;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

/// Periodically force-refreshes every tracked fund and the benchmark
pub struct RefreshScheduler {
    tracker: Arc<TrackerService>,
    period: Duration,
    on_startup: bool,
}

impl RefreshScheduler {
    /// # Arguments
    /// * `tracker` - Tracker service whose catalog is refreshed
    /// * `period` - Time between refresh runs
    /// * `on_startup` - Run once immediately instead of waiting a full period
    pub fn new(tracker: Arc<TrackerService>, period: Duration, on_startup: bool) -> Self {
        Self {
            tracker,
            period,
            on_startup,
        }
    }

    /// Run the refresh loop until shutdown (spawn with tokio::spawn)
    pub async fn run(self, mut shutdown: ShutdownToken) {
        info!(
            period_secs = self.period.as_secs(),
            on_startup = self.on_startup,
            "Refresh scheduler started"
        );

        let start = if self.on_startup {
            Instant::now()
        } else {
            Instant::now() + self.period
        };
        let mut tick = interval_at(start, self.period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if let Err(e) = self.run_now().await {
                        error!(error = ?e, "Scheduled refresh failed");
                    }
                }
                _ = shutdown.wait() => {
                    info!("Refresh scheduler shutting down");
                    break;
                }
            }
        }
    }

    /// Refresh immediately (manual trigger)
    pub async fn run_now(&self) -> Result<RefreshReport> {
        let report = self.tracker.refresh(None).await?;

        if report.is_success() {
            info!(
                run_id = %report.run_id,
                refreshed = report.refreshed.len(),
                "Scheduled refresh completed"
            );
        } else {
            for failure in &report.failed {
                warn!(
                    run_id = %report.run_id,
                    key = %failure.key,
                    error = %failure.error,
                    "Refresh failed for entry"
                );
            }
        }

        Ok(report)
    }
}
