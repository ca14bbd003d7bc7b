// Terminal rendering for daemon responses

use chrono::{DateTime, NaiveDate};
use colored::Colorize;
use navtrack_core::domain::{AnalysisRow, ComparisonPoint, Fund, FundSummary, RefreshReport};
use tabled::settings::Style;
use tabled::{Table, Tabled};

const BAR_WIDTH: usize = 40;
const MISSING: &str = "n/a";

/// `12.34` / `n/a`
pub fn number(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| MISSING.to_string())
}

/// `12.34%` / `n/a`
pub fn percent(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}%", v))
        .unwrap_or_else(|| MISSING.to_string())
}

pub fn date(value: Option<NaiveDate>) -> String {
    value
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| MISSING.to_string())
}

/// Epoch millis as local-agnostic UTC timestamp
pub fn timestamp(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| MISSING.to_string())
}

pub fn megabytes(bytes: i64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// Bar scaled so `max` fills the full width
pub fn bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let filled = ((value / max) * width as f64).round() as usize;
    "█".repeat(filled.min(width))
}

#[derive(Tabled)]
struct FundRow {
    #[tabled(rename = "Fund")]
    name: String,
    #[tabled(rename = "Scheme Code")]
    code: String,
}

pub fn funds_table(funds: &[Fund]) -> String {
    let rows: Vec<FundRow> = funds
        .iter()
        .map(|f| FundRow {
            name: f.name.clone(),
            code: f.code.to_string(),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Tile block for one fund
pub fn summary_tile(summary: &FundSummary) -> Vec<String> {
    let mut lines = vec![format!("{}", summary.fund.name.cyan().bold())];

    if let Some(error) = &summary.error {
        lines.push(format!("  {} {}", "Error:".bold(), error.red()));
    }

    lines.push(format!(
        "  {} {} ({})",
        "Current NAV:".bold(),
        number(summary.current_nav),
        date(summary.current_date)
    ));
    lines.push(format!(
        "  {} {} ({})",
        "All-Time High:".bold(),
        number(summary.max_nav),
        date(summary.max_date)
    ));
    lines.push(format!(
        "  {} fund {} | nifty {}",
        "2Y CAGR:".bold(),
        percent(summary.fund_cagr_2y),
        percent(summary.nifty_cagr_2y)
    ));
    lines.push(format!(
        "  {} fund {} | nifty {}",
        "5Y CAGR:".bold(),
        percent(summary.fund_cagr_5y),
        percent(summary.nifty_cagr_5y)
    ));

    if summary.buy_alert {
        let drawdown = match (summary.current_nav, summary.max_nav) {
            (Some(current), Some(high)) if high > 0.0 => Some((1.0 - current / high) * 100.0),
            _ => None,
        };
        let alert = format!("BUY ALERT: {} below all-time high", percent(drawdown));
        lines.push(format!("  {}", alert.green().bold()));
    }
    lines
}

#[derive(Tabled)]
struct AnalysisTableRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "NAV")]
    nav: String,
    #[tabled(rename = "Fund Change (%)")]
    fund_change: String,
    #[tabled(rename = "Nifty Change (%)")]
    nifty_change: String,
}

/// Monthly table; underperforming rows come out red
///
/// Cells stay plain text; color is applied per rendered line.
pub fn analysis_table(rows: &[AnalysisRow]) -> String {
    let table_rows: Vec<AnalysisTableRow> = rows
        .iter()
        .map(|row| AnalysisTableRow {
            date: row.date.format("%Y-%m-%d").to_string(),
            nav: format!("{:.2}", row.nav),
            fund_change: percent(row.fund_change_pct),
            nifty_change: percent(row.nifty_change_pct),
        })
        .collect();
    let table = Table::new(table_rows).with(Style::rounded()).to_string();

    let flagged: Vec<String> = rows
        .iter()
        .filter(|r| r.underperforming)
        .map(|r| r.date.format("%Y-%m-%d").to_string())
        .collect();

    table
        .lines()
        .map(|line| {
            if flagged.iter().any(|d| line.contains(d.as_str())) {
                line.red().to_string()
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Tabled)]
struct ChartRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Fund")]
    fund: String,
    #[tabled(rename = "Nifty 50")]
    nifty: String,
}

pub fn chart_table(points: &[ComparisonPoint]) -> String {
    let rows: Vec<ChartRow> = points
        .iter()
        .map(|p| ChartRow {
            date: p.date.format("%Y-%m-%d").to_string(),
            fund: format!("{:.2}", p.fund_norm),
            nifty: format!("{:.2}", p.nifty_norm),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Bars for the latest normalized values, longest bar = larger value
pub fn chart_bars(fund_name: &str, points: &[ComparisonPoint]) -> Vec<String> {
    let Some(last) = points.last() else {
        return Vec::new();
    };
    let max = last.fund_norm.max(last.nifty_norm);
    vec![
        format!(
            "{:<12} {} {:.2}",
            truncate(fund_name, 12),
            bar(last.fund_norm, max, BAR_WIDTH).green(),
            last.fund_norm
        ),
        format!(
            "{:<12} {} {:.2}",
            "Nifty 50",
            bar(last.nifty_norm, max, BAR_WIDTH).blue(),
            last.nifty_norm
        ),
    ]
}

pub fn refresh_lines(report: &RefreshReport) -> Vec<String> {
    let mut lines = vec![format!(
        "  {} {} ({} ms)",
        "Run:".bold(),
        report.run_id,
        report.duration_ms()
    )];
    for key in &report.refreshed {
        lines.push(format!("  {} {}", "✓".green(), key));
    }
    for failure in &report.failed {
        lines.push(format!("  {} {}: {}", "✗".red(), failure.key, failure.error));
    }
    lines
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use navtrack_core::domain::SchemeCode;

    fn fund() -> Fund {
        Fund::new("Parag Parikh Flexi Cap", SchemeCode::new("122639").unwrap())
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_missing_values_render_na() {
        assert_eq!(number(None), "n/a");
        assert_eq!(percent(None), "n/a");
        assert_eq!(date(None), "n/a");
        assert_eq!(number(Some(79.8)), "79.80");
        assert_eq!(percent(Some(-4.999)), "-5.00%");
        assert_eq!(date(Some(d(2025, 1, 3))), "2025-01-03");
    }

    #[test]
    fn test_timestamp_and_megabytes() {
        assert_eq!(timestamp(1_735_689_600_000), "2025-01-01 00:00:00 UTC");
        assert_eq!(megabytes(3 * 1024 * 1024), 3.0);
    }

    #[test]
    fn test_bar_scaling() {
        assert_eq!(bar(50.0, 100.0, 10).chars().count(), 5);
        assert_eq!(bar(100.0, 100.0, 10).chars().count(), 10);
        assert_eq!(bar(250.0, 100.0, 10).chars().count(), 10);
        assert!(bar(0.0, 100.0, 10).is_empty());
        assert!(bar(10.0, 0.0, 10).is_empty());
    }

    #[test]
    fn test_summary_tile_unavailable_fund() {
        colored::control::set_override(false);
        let summary = FundSummary::unavailable(fund(), Some("timeout".into()));
        let lines = summary_tile(&summary);

        assert!(lines.iter().any(|l| l.contains("Error: timeout")));
        assert!(lines.iter().any(|l| l.contains("Current NAV: n/a (n/a)")));
        assert!(lines.iter().all(|l| !l.contains("BUY ALERT")));
    }

    #[test]
    fn test_summary_tile_buy_alert() {
        colored::control::set_override(false);
        let mut summary = FundSummary::unavailable(fund(), None);
        summary.current_nav = Some(79.8);
        summary.max_nav = Some(100.0);
        summary.buy_alert = true;

        let lines = summary_tile(&summary);
        assert!(lines.iter().any(|l| l.contains("79.80")));
        assert!(lines
            .iter()
            .any(|l| l.contains("BUY ALERT: 20.20% below all-time high")));
    }

    #[test]
    fn test_analysis_table_headers_and_values() {
        colored::control::set_override(false);
        let rows = vec![
            AnalysisRow {
                date: d(2025, 1, 3),
                nav: 79.8,
                fund_change_pct: Some(-5.0),
                nifty_change_pct: Some(1.0),
                underperforming: true,
            },
            AnalysisRow {
                date: d(2024, 12, 3),
                nav: 84.0,
                fund_change_pct: None,
                nifty_change_pct: None,
                underperforming: false,
            },
        ];

        let table = analysis_table(&rows);
        assert!(table.contains("Fund Change (%)"));
        assert!(table.contains("Nifty Change (%)"));
        assert!(table.contains("-5.00%"));
        assert!(table.contains("n/a"));
        assert!(table.find("2025-01-03") < table.find("2024-12-03"));
    }

    #[test]
    fn test_chart_bars_use_latest_point() {
        colored::control::set_override(false);
        let points = vec![
            ComparisonPoint {
                date: d(2024, 12, 3),
                fund_norm: 100.0,
                nifty_norm: 100.0,
            },
            ComparisonPoint {
                date: d(2025, 1, 3),
                fund_norm: 95.0,
                nifty_norm: 110.0,
            },
        ];

        let lines = chart_bars("Parag Parikh Flexi Cap", &points);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Parag Parikh"));
        assert!(lines[0].ends_with("95.00"));
        assert!(lines[1].ends_with("110.00"));
        assert!(chart_bars("x", &[]).is_empty());
    }

    #[test]
    fn test_refresh_lines() {
        colored::control::set_override(false);
        let report = RefreshReport {
            run_id: "run-1".into(),
            started_at: 1_000,
            finished_at: 1_250,
            refreshed: vec!["122639".into()],
            failed: vec![navtrack_core::domain::RefreshFailure {
                key: "^NSEI".into(),
                error: "timeout".into(),
            }],
        };

        let lines = refresh_lines(&report);
        assert!(lines[0].contains("run-1 (250 ms)"));
        assert!(lines.iter().any(|l| l.contains("✓ 122639")));
        assert!(lines.iter().any(|l| l.contains("✗ ^NSEI: timeout")));
    }
}
