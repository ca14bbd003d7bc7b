// SQLite HistoryCache - upstream responses keyed by scheme code / symbol

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use navtrack_core::domain::{
    BenchmarkPoint, BenchmarkSeries, NavHistory, NavPoint, RefreshFailure, RefreshReport,
    SchemeCode,
};
use navtrack_core::error::{AppError, Result};
use navtrack_core::port::{Cached, HistoryCache};
use sqlx::SqlitePool;
use tracing::debug;

pub struct SqliteHistoryCache {
    pool: SqlitePool,
}

impl SqliteHistoryCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryCache for SqliteHistoryCache {
    async fn load_nav(&self, code: &SchemeCode) -> Result<Option<Cached<NavHistory>>> {
        let row = sqlx::query_as::<_, NavCacheRow>(
            r#"
            SELECT scheme_code, scheme_name, fund_house, points_json, fetched_at
            FROM nav_cache WHERE scheme_code = ?
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(NavCacheRow::into_cached).transpose()
    }

    async fn store_nav(&self, history: &NavHistory, fetched_at: i64) -> Result<()> {
        let points_json = serde_json::to_string(history.points())?;

        sqlx::query(
            r#"
            INSERT INTO nav_cache
                (scheme_code, scheme_name, fund_house, points_json, point_count, fetched_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(scheme_code) DO UPDATE SET
                scheme_name = excluded.scheme_name,
                fund_house = excluded.fund_house,
                points_json = excluded.points_json,
                point_count = excluded.point_count,
                fetched_at = excluded.fetched_at
            "#,
        )
        .bind(history.code.as_str())
        .bind(&history.scheme_name)
        .bind(&history.fund_house)
        .bind(points_json)
        .bind(history.len() as i64)
        .bind(fetched_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!(code = %history.code, points = history.len(), "Stored NAV history");
        Ok(())
    }

    async fn load_benchmark(&self, symbol: &str) -> Result<Option<Cached<BenchmarkSeries>>> {
        let row = sqlx::query_as::<_, BenchmarkCacheRow>(
            "SELECT symbol, points_json, fetched_at FROM benchmark_cache WHERE symbol = ?",
        )
        .bind(symbol)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(BenchmarkCacheRow::into_cached).transpose()
    }

    async fn store_benchmark(&self, series: &BenchmarkSeries, fetched_at: i64) -> Result<()> {
        let points_json = serde_json::to_string(series.points())?;

        sqlx::query(
            r#"
            INSERT INTO benchmark_cache (symbol, points_json, point_count, fetched_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(symbol) DO UPDATE SET
                points_json = excluded.points_json,
                point_count = excluded.point_count,
                fetched_at = excluded.fetched_at
            "#,
        )
        .bind(&series.symbol)
        .bind(points_json)
        .bind(series.len() as i64)
        .bind(fetched_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!(symbol = %series.symbol, points = series.len(), "Stored benchmark series");
        Ok(())
    }

    async fn record_refresh(&self, report: &RefreshReport) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_runs
                (run_id, started_at, finished_at, refreshed_json, failed_json, failed_count)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&report.run_id)
        .bind(report.started_at)
        .bind(report.finished_at)
        .bind(serde_json::to_string(&report.refreshed)?)
        .bind(serde_json::to_string(&report.failed)?)
        .bind(report.failed.len() as i64)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn last_refresh(&self) -> Result<Option<RefreshReport>> {
        let row = sqlx::query_as::<_, RefreshRunRow>(
            r#"
            SELECT run_id, started_at, finished_at, refreshed_json, failed_json
            FROM refresh_runs
            ORDER BY finished_at DESC, rowid DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(RefreshRunRow::into_report).transpose()
    }

    async fn entry_count(&self) -> Result<i64> {
        sqlx::query_scalar(
            "SELECT (SELECT COUNT(*) FROM nav_cache) + (SELECT COUNT(*) FROM benchmark_cache)",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct NavCacheRow {
    scheme_code: String,
    scheme_name: Option<String>,
    fund_house: Option<String>,
    points_json: String,
    fetched_at: i64,
}

impl NavCacheRow {
    fn into_cached(self) -> Result<Cached<NavHistory>> {
        let code = SchemeCode::new(self.scheme_code)?;
        let points: Vec<NavPoint> = serde_json::from_str(&self.points_json)?;
        let history = NavHistory::new(code, points).with_meta(self.scheme_name, self.fund_house);
        Ok(Cached::new(history, self.fetched_at))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BenchmarkCacheRow {
    symbol: String,
    points_json: String,
    fetched_at: i64,
}

impl BenchmarkCacheRow {
    fn into_cached(self) -> Result<Cached<BenchmarkSeries>> {
        let points: Vec<BenchmarkPoint> = serde_json::from_str(&self.points_json)?;
        Ok(Cached::new(BenchmarkSeries::new(self.symbol, points), self.fetched_at))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RefreshRunRow {
    run_id: String,
    started_at: i64,
    finished_at: i64,
    refreshed_json: String,
    failed_json: String,
}

impl RefreshRunRow {
    fn into_report(self) -> Result<RefreshReport> {
        let refreshed: Vec<String> = serde_json::from_str(&self.refreshed_json)?;
        let failed: Vec<RefreshFailure> = serde_json::from_str(&self.failed_json).map_err(|e| {
            AppError::Database(format!("Corrupt refresh run {}: {}", self.run_id, e))
        })?;

        Ok(RefreshReport {
            run_id: self.run_id,
            started_at: self.started_at,
            finished_at: self.finished_at,
            refreshed,
            failed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use chrono::NaiveDate;

    async fn setup_cache() -> SqliteHistoryCache {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteHistoryCache::new(pool)
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn history(nav: f64) -> NavHistory {
        NavHistory::new(
            SchemeCode::new("127042").unwrap(),
            vec![NavPoint::new(d(2025, 1, 3), nav), NavPoint::new(d(2024, 12, 3), 90.0)],
        )
        .with_meta(Some("Motilal Oswal Midcap Fund".into()), None)
    }

    #[tokio::test]
    async fn test_nav_roundtrip_and_upsert() {
        let cache = setup_cache().await;
        let code = SchemeCode::new("127042").unwrap();

        assert!(cache.load_nav(&code).await.unwrap().is_none());

        cache.store_nav(&history(100.0), 1_000).await.unwrap();
        cache.store_nav(&history(105.5), 2_000).await.unwrap();

        let cached = cache.load_nav(&code).await.unwrap().unwrap();
        assert_eq!(cached.fetched_at, 2_000);
        assert_eq!(cached.value, history(105.5));
        assert_eq!(cached.value.points()[0].date, d(2024, 12, 3));
        assert_eq!(cache.entry_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_benchmark_roundtrip() {
        let cache = setup_cache().await;
        let series = BenchmarkSeries::new(
            "^NSEI",
            vec![
                BenchmarkPoint::new(d(2024, 12, 1), 24131.1),
                BenchmarkPoint::new(d(2025, 1, 1), 23508.4),
            ],
        );

        cache.store_benchmark(&series, 5_000).await.unwrap();

        let cached = cache.load_benchmark("^NSEI").await.unwrap().unwrap();
        assert_eq!(cached.value, series);
        assert!(cache.load_benchmark("^BSESN").await.unwrap().is_none());
        assert_eq!(cache.entry_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_last_refresh_returns_latest_run() {
        let cache = setup_cache().await;
        assert!(cache.last_refresh().await.unwrap().is_none());

        let first = RefreshReport {
            run_id: "run-a".into(),
            started_at: 100,
            finished_at: 200,
            refreshed: vec!["122639".into()],
            failed: vec![],
        };
        let second = RefreshReport {
            run_id: "run-b".into(),
            started_at: 300,
            finished_at: 450,
            refreshed: vec![],
            failed: vec![RefreshFailure {
                key: "^NSEI".into(),
                error: "Request timed out: slow".into(),
            }],
        };

        cache.record_refresh(&first).await.unwrap();
        cache.record_refresh(&second).await.unwrap();

        assert_eq!(cache.last_refresh().await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_duplicate_run_id_rejected() {
        let cache = setup_cache().await;
        let report = RefreshReport {
            run_id: "run-a".into(),
            started_at: 1,
            finished_at: 2,
            refreshed: vec![],
            failed: vec![],
        };

        cache.record_refresh(&report).await.unwrap();
        let err = cache.record_refresh(&report).await.unwrap_err();
        assert!(matches!(err, AppError::Database(msg) if msg.contains("Unique")));
    }
}
