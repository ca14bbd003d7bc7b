// SQLite Maintenance Implementation
use crate::error::map_sqlx_error;
use async_trait::async_trait;
use navtrack_core::error::{AppError, Result};
use navtrack_core::port::{Maintenance, MaintenanceStats, PurgeStats, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::info;

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// SQLite maintenance implementation
pub struct SqliteMaintenance {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteMaintenance {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }

    async fn pragma(&self, name: &str) -> Result<i64> {
        sqlx::query_scalar(&format!("PRAGMA {}", name))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("PRAGMA {} failed: {}", name, e)))
    }

    /// DB size in bytes and the share of free pages
    async fn size_and_fragmentation(&self) -> Result<(i64, f64)> {
        let page_count = self.pragma("page_count").await?;
        let page_size = self.pragma("page_size").await?;
        let freelist_count = self.pragma("freelist_count").await?;

        let fragmentation = if page_count > 0 {
            freelist_count as f64 / page_count as f64 * 100.0
        } else {
            0.0
        };
        Ok((page_count * page_size, fragmentation))
    }

    async fn count(&self, table: &str) -> Result<i64> {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }
}

fn bytes_to_mb(bytes: i64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

#[async_trait]
impl Maintenance for SqliteMaintenance {
    async fn vacuum(&self) -> Result<f64> {
        let (before, _) = self.size_and_fragmentation().await?;

        sqlx::query("VACUUM")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("VACUUM failed: {}", e)))?;

        let (after, _) = self.size_and_fragmentation().await?;
        let reclaimed = bytes_to_mb((before - after).max(0));

        info!(
            size_before_mb = bytes_to_mb(before),
            size_after_mb = bytes_to_mb(after),
            reclaimed_mb = reclaimed,
            "VACUUM completed"
        );

        Ok(reclaimed)
    }

    async fn purge_stale(&self, retention_days: i64) -> Result<PurgeStats> {
        let cutoff = self
            .time_provider
            .now_millis()
            .saturating_sub(retention_days.saturating_mul(MS_PER_DAY));

        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let navs = sqlx::query("DELETE FROM nav_cache WHERE fetched_at < ?")
            .bind(cutoff)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

        let benchmarks = sqlx::query("DELETE FROM benchmark_cache WHERE fetched_at < ?")
            .bind(cutoff)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

        let runs = sqlx::query("DELETE FROM refresh_runs WHERE finished_at < ?")
            .bind(cutoff)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

        tx.commit().await.map_err(map_sqlx_error)?;

        let stats = PurgeStats {
            entries_purged: (navs + benchmarks) as i64,
            runs_purged: runs as i64,
        };

        info!(
            retention_days = retention_days,
            cutoff = cutoff,
            entries_purged = stats.entries_purged,
            runs_purged = stats.runs_purged,
            "Purged stale cache data"
        );

        Ok(stats)
    }

    async fn get_stats(&self) -> Result<MaintenanceStats> {
        let (db_size_bytes, fragmentation_percent) = self.size_and_fragmentation().await?;

        Ok(MaintenanceStats {
            db_size_mb: bytes_to_mb(db_size_bytes),
            db_size_bytes,
            nav_entries: self.count("nav_cache").await?,
            benchmark_entries: self.count("benchmark_cache").await?,
            refresh_runs: self.count("refresh_runs").await?,
            fragmentation_percent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations, SqliteHistoryCache};
    use chrono::NaiveDate;
    use navtrack_core::domain::{NavHistory, NavPoint, RefreshReport, SchemeCode};
    use navtrack_core::port::time_provider::FixedTimeProvider;
    use navtrack_core::port::{HistoryCache, MaintenanceConfig};

    const NOW: i64 = 1_735_689_600_000; // 2025-01-01

    async fn setup() -> (SqliteHistoryCache, SqliteMaintenance) {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();

        let time_provider = Arc::new(FixedTimeProvider::new(NOW));
        (
            SqliteHistoryCache::new(pool.clone()),
            SqliteMaintenance::new(pool, time_provider),
        )
    }

    fn history(code: &str) -> NavHistory {
        NavHistory::new(
            SchemeCode::new(code).unwrap(),
            vec![NavPoint::new(NaiveDate::from_ymd_opt(2024, 12, 3).unwrap(), 10.0)],
        )
    }

    fn run(id: &str, finished_at: i64) -> RefreshReport {
        RefreshReport {
            run_id: id.into(),
            started_at: finished_at - 10,
            finished_at,
            refreshed: vec![],
            failed: vec![],
        }
    }

    #[tokio::test]
    async fn test_maintenance_stats() {
        let (cache, maintenance) = setup().await;
        cache.store_nav(&history("122639"), NOW).await.unwrap();
        cache.record_refresh(&run("r1", NOW)).await.unwrap();

        let stats = maintenance.get_stats().await.unwrap();

        assert!(stats.db_size_mb > 0.0);
        assert_eq!(stats.nav_entries, 1);
        assert_eq!(stats.benchmark_entries, 0);
        assert_eq!(stats.refresh_runs, 1);
        assert!((0.0..=100.0).contains(&stats.fragmentation_percent));
    }

    #[tokio::test]
    async fn test_vacuum() {
        let (_, maintenance) = setup().await;

        let reclaimed = maintenance.vacuum().await.unwrap();
        assert!(reclaimed >= 0.0);
    }

    #[tokio::test]
    async fn test_purge_stale_respects_retention() {
        let (cache, maintenance) = setup().await;
        let ten_days_ago = NOW - 10 * MS_PER_DAY;

        cache.store_nav(&history("122639"), ten_days_ago).await.unwrap();
        cache.store_nav(&history("127042"), NOW - MS_PER_DAY).await.unwrap();
        cache.record_refresh(&run("old", ten_days_ago)).await.unwrap();
        cache.record_refresh(&run("new", NOW)).await.unwrap();

        let purged = maintenance.purge_stale(7).await.unwrap();
        assert_eq!(
            purged,
            PurgeStats {
                entries_purged: 1,
                runs_purged: 1
            }
        );

        assert!(cache.load_nav(&SchemeCode::new("122639").unwrap()).await.unwrap().is_none());
        assert!(cache.load_nav(&SchemeCode::new("127042").unwrap()).await.unwrap().is_some());
        assert_eq!(cache.last_refresh().await.unwrap().unwrap().run_id, "new");
    }

    #[tokio::test]
    async fn test_purge_stale_huge_retention_keeps_everything() {
        let (cache, maintenance) = setup().await;
        cache.store_nav(&history("122639"), NOW - 400 * MS_PER_DAY).await.unwrap();

        let purged = maintenance.purge_stale(i64::MAX).await.unwrap();
        assert_eq!(purged, PurgeStats::default());
        assert_eq!(cache.entry_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_full_maintenance_vacuums_when_oversized() {
        let (cache, maintenance) = setup().await;
        cache.store_nav(&history("122639"), NOW - 90 * MS_PER_DAY).await.unwrap();

        let config = MaintenanceConfig {
            retention_days: 30,
            max_db_size_mb: 0.0,
        };
        let stats = maintenance.run_full_maintenance(&config).await.unwrap();

        assert_eq!(stats.nav_entries, 0);
    }
}
