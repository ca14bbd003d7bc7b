//! navtrack CLI - Command-line client for the navtrack daemon

mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use navtrack_core::domain::{ComparisonPoint, Fund, FundAnalysis, FundSummary, RefreshReport};
use serde::{Deserialize, Serialize};
use serde_json::json;

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9630";

#[derive(Parser)]
#[command(name = "navtrack")]
#[command(about = "Mutual fund NAV tracker CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "NAVTRACK_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List tracked funds
    Funds,

    /// Headline numbers per fund (current NAV, ATH, CAGR)
    Summary {
        /// Fund name or scheme code (default: all funds)
        #[arg(short, long)]
        fund: Option<String>,
    },

    /// Monthly fund vs Nifty 50 table
    Analyze {
        /// Fund name or scheme code
        fund: String,
    },

    /// Normalized (base 100) fund vs Nifty 50 comparison
    Chart {
        /// Fund name or scheme code
        fund: String,
    },

    /// Refetch NAV history and the benchmark, bypassing the cache
    Refresh {
        /// Fund name or scheme code (default: all funds)
        #[arg(short, long)]
        fund: Option<String>,
    },

    /// Show daemon status
    Status,

    /// Run maintenance operations
    Maintenance {
        /// Force VACUUM even if not needed
        #[arg(long)]
        force_vacuum: bool,
    },
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize)]
struct FundsListResult {
    funds: Vec<Fund>,
}

#[derive(Deserialize)]
struct SummaryResult {
    summaries: Vec<FundSummary>,
}

#[derive(Deserialize)]
struct ChartResult {
    fund: Fund,
    points: Vec<ComparisonPoint>,
    warnings: Vec<String>,
}

#[derive(Deserialize)]
struct StatsResult {
    version: String,
    fund_count: usize,
    nav_entries: i64,
    benchmark_entries: i64,
    refresh_runs: i64,
    db_size_bytes: i64,
    fragmentation_percent: f64,
    cache_ttl_hours: f64,
    last_refresh: Option<RefreshReport>,
    uptime_seconds: i64,
}

#[derive(Deserialize)]
struct MaintenanceResult {
    vacuum_run: bool,
    entries_purged: i64,
    runs_purged: i64,
    db_size_before: i64,
    db_size_after: i64,
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        println!("{} {}", "⚠".yellow(), warning.yellow());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Funds => {
            let result = call_rpc(&cli.rpc_url, "funds.list.v1", json!({})).await?;
            let list: FundsListResult = serde_json::from_value(result)?;

            println!("{}", "Tracked Funds".cyan().bold());
            println!("{}", render::funds_table(&list.funds));
        }

        Commands::Summary { fund } => {
            let result = call_rpc(&cli.rpc_url, "fund.summary.v1", json!({ "fund": fund })).await?;
            let summary: SummaryResult = serde_json::from_value(result)?;

            println!("{}", "Mutual Fund NAV Tracker".cyan().bold());
            for tile in &summary.summaries {
                println!();
                for line in render::summary_tile(tile) {
                    println!("{}", line);
                }
            }
        }

        Commands::Analyze { fund } => {
            let result = call_rpc(&cli.rpc_url, "fund.analysis.v1", json!({ "fund": fund })).await?;
            let analysis: FundAnalysis = serde_json::from_value(result)?;

            println!(
                "{}",
                format!("{} vs Nifty 50 (monthly)", analysis.fund.name)
                    .cyan()
                    .bold()
            );
            print_warnings(&analysis.warnings);

            if analysis.rows.is_empty() {
                println!("{}", "No monthly data in the analysis window".yellow());
            } else {
                println!("{}", render::analysis_table(&analysis.rows));
                let lagging = analysis.rows.iter().filter(|r| r.underperforming).count();
                if lagging > 0 {
                    println!(
                        "{}",
                        format!("{} month(s) trailed Nifty 50 beyond the margin", lagging).red()
                    );
                }
            }
        }

        Commands::Chart { fund } => {
            let result = call_rpc(&cli.rpc_url, "fund.chart.v1", json!({ "fund": fund })).await?;
            let chart: ChartResult = serde_json::from_value(result)?;

            println!(
                "{}",
                format!("{} vs Nifty 50 (normalized to 100)", chart.fund.name)
                    .cyan()
                    .bold()
            );
            print_warnings(&chart.warnings);

            if chart.points.is_empty() {
                println!("{}", "Nothing to chart".yellow());
            } else {
                println!("{}", render::chart_table(&chart.points));
                println!();
                for line in render::chart_bars(&chart.fund.name, &chart.points) {
                    println!("{}", line);
                }
            }
        }

        Commands::Refresh { fund } => {
            println!("{}", "Refreshing market data...".cyan().bold());

            let result = call_rpc(&cli.rpc_url, "cache.refresh.v1", json!({ "fund": fund })).await?;
            let report: RefreshReport = serde_json::from_value(result)?;

            for line in render::refresh_lines(&report) {
                println!("{}", line);
            }
            if report.is_success() {
                println!("{}", "✓ Refresh completed".green().bold());
            } else {
                println!(
                    "{}",
                    format!("✗ {} source(s) failed", report.failed.len()).red().bold()
                );
            }
        }

        Commands::Status => {
            println!("{}", "System Status".cyan().bold());
            println!();

            match call_rpc(&cli.rpc_url, "admin.stats.v1", json!({})).await {
                Ok(result) => {
                    let stats: StatsResult = serde_json::from_value(result)?;

                    println!("  {} {}", "RPC URL:".bold(), cli.rpc_url);
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!("  {} {}", "Version:".bold(), stats.version);
                    println!();
                    println!("  {} {}", "Funds:".bold(), stats.fund_count);
                    println!("  {} {}", "Cached NAV histories:".bold(), stats.nav_entries);
                    println!("  {} {}", "Cached benchmarks:".bold(), stats.benchmark_entries);
                    println!("  {} {}", "Refresh runs:".bold(), stats.refresh_runs);
                    println!("  {} {} hours", "Cache TTL:".bold(), stats.cache_ttl_hours);
                    match &stats.last_refresh {
                        Some(run) => println!(
                            "  {} {} ({} refreshed, {} failed)",
                            "Last refresh:".bold(),
                            render::timestamp(run.finished_at),
                            run.refreshed.len(),
                            run.failed.len()
                        ),
                        None => println!("  {} never", "Last refresh:".bold()),
                    }
                    println!();
                    println!(
                        "  {} {:.2} MB ({:.1}% free pages)",
                        "DB Size:".bold(),
                        render::megabytes(stats.db_size_bytes),
                        stats.fragmentation_percent
                    );
                    println!("  {} {} seconds", "Uptime:".bold(), stats.uptime_seconds);
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }

        Commands::Maintenance { force_vacuum } => {
            println!("{}", "Running maintenance...".cyan().bold());
            println!();

            if force_vacuum {
                println!("  {} Force VACUUM enabled", "•".bold());
            }

            let params = json!({ "force_vacuum": force_vacuum });

            match call_rpc(&cli.rpc_url, "admin.maintenance.v1", params).await {
                Ok(result) => {
                    let outcome: MaintenanceResult = serde_json::from_value(result)?;

                    println!("  ✓ Maintenance completed");
                    println!();
                    if outcome.vacuum_run {
                        println!("  {} VACUUM executed", "✓".green());
                    } else {
                        println!("  ○ VACUUM skipped (not needed)");
                    }
                    println!(
                        "  {} {} stale cache entries purged",
                        "✓".green(),
                        outcome.entries_purged
                    );
                    println!(
                        "  {} {} refresh runs purged",
                        "✓".green(),
                        outcome.runs_purged
                    );
                    println!();
                    let size_before_mb = render::megabytes(outcome.db_size_before);
                    let size_after_mb = render::megabytes(outcome.db_size_after);
                    println!(
                        "  {} {:.2} MB → {:.2} MB",
                        "DB Size:".bold(),
                        size_before_mb,
                        size_after_mb
                    );
                }
                Err(e) => {
                    println!("  {} Maintenance failed: {}", "✗".red(), e);
                }
            }
        }
    }

    Ok(())
}
