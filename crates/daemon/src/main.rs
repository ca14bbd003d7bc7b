//! navtrackd - Mutual Fund NAV Tracker daemon
//!
//! Serves fund summaries and fund-vs-Nifty analysis over JSON-RPC and keeps
//! the NAV cache warm in the background.

mod config;
mod logging;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use config::DaemonConfig;
use navtrack_api_rpc::{RateLimiter, RpcHandler, RpcServer, RpcServerConfig};
use navtrack_core::application::{
    shutdown_channel, MaintenanceScheduler, MarketDataService, RefreshScheduler, RetryPolicy,
    TrackerService,
};
use navtrack_core::port::id_provider::UuidProvider;
use navtrack_core::port::time_provider::SystemTimeProvider;
use navtrack_infra_http::{MfApiClient, YahooChartClient};
use navtrack_infra_sqlite::{create_pool, run_migrations, SqliteHistoryCache, SqliteMaintenance};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "navtrackd")]
#[command(about = "Mutual fund NAV tracker daemon", long_about = None)]
#[command(version)]
struct Args {
    /// Config file (TOML); defaults to the per-user config dir
    #[arg(long, env = "NAVTRACK_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Configuration
    let config = DaemonConfig::load(args.config.as_deref())?;

    // 2. Logging
    let _log_guard = logging::init(&config.logging)?;
    info!(version = navtrack_core::VERSION, "navtrackd starting");

    #[cfg(not(feature = "telemetry"))]
    if telemetry::endpoint().is_some() {
        warn!("OTEL_EXPORTER_OTLP_ENDPOINT set but feature 'telemetry' not enabled");
    }

    config.validate()?;
    let catalog = Arc::new(config.fund_catalog()?);
    info!(funds = catalog.len(), "Fund catalog loaded");

    // 3. Database
    let db_path = config.database_path();
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    info!(db_path = %db_path.display(), "Opening cache database");

    let pool = create_pool(&format!("sqlite://{}", db_path.display()))
        .await
        .context("DB pool creation failed")?;
    run_migrations(&pool).await.context("Migration failed")?;

    // 4. Adapters (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let id_provider = Arc::new(UuidProvider);
    let nav_source = Arc::new(MfApiClient::new(&config.http).context("NAV client setup failed")?);
    let benchmark_source =
        Arc::new(YahooChartClient::new(&config.http).context("Benchmark client setup failed")?);
    let cache = Arc::new(SqliteHistoryCache::new(pool.clone()));
    let maintenance = Arc::new(SqliteMaintenance::new(pool.clone(), time_provider.clone()));

    let market = Arc::new(MarketDataService::new(
        nav_source,
        benchmark_source,
        cache.clone(),
        time_provider.clone(),
        id_provider,
        RetryPolicy::new(config.refresh.max_attempts, config.refresh.base_delay_ms),
        config.cache_settings(),
    ));
    let tracker = Arc::new(TrackerService::new(
        catalog,
        market,
        config.analysis.clone(),
        time_provider,
    ));

    // 5. JSON-RPC server
    let handler = Arc::new(RpcHandler::new(
        tracker.clone(),
        cache,
        maintenance.clone(),
        config.maintenance_config(),
        RateLimiter::new(config.server.rate_limit_burst, config.server.rate_limit_per_sec),
    ));
    let rpc_config = RpcServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    let (rpc_addr, rpc_handle) = RpcServer::new(rpc_config, handler)
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    // 6. Background schedulers
    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    let refresh_scheduler =
        RefreshScheduler::new(tracker, config.refresh_period(), config.refresh.on_startup);
    let refresh_handle = tokio::spawn(refresh_scheduler.run(shutdown_rx.clone()));

    let maintenance_scheduler = MaintenanceScheduler::new(
        maintenance,
        config.maintenance_config(),
        config.maintenance.interval_hours,
    );
    let maintenance_handle = tokio::spawn(maintenance_scheduler.run(shutdown_rx));

    info!(rpc = %rpc_addr, "System ready. Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting gracefully...");

    shutdown_tx.shutdown();
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;

    if tokio::time::timeout(SHUTDOWN_TIMEOUT, refresh_handle).await.is_err() {
        warn!("Refresh scheduler did not stop in time (refresh in flight)");
    }
    let _ = tokio::time::timeout(SHUTDOWN_TIMEOUT, maintenance_handle).await;

    pool.close().await;
    telemetry::shutdown();
    info!("Shutdown complete.");

    Ok(())
}
