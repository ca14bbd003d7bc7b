//! Daemon configuration
//!
//! Layers, lowest precedence first: built-in defaults, an optional TOML file,
//! then `NAVTRACK_*` environment variables (`NAVTRACK_SERVER__PORT=9700`).

use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use directories::ProjectDirs;
use navtrack_core::application::constants::{
    DAYS_PER_YEAR, DEFAULT_CACHE_TTL_HOURS, DEFAULT_MAX_ATTEMPTS, DEFAULT_REFRESH_INTERVAL,
    DEFAULT_RETRY_BASE_DELAY_MS, MAX_INTERVAL_HOURS, MAX_WINDOW_YEARS,
};
use navtrack_core::application::{AnalysisSettings, CacheSettings};
use navtrack_core::domain::{Fund, FundCatalog};
use navtrack_core::port::MaintenanceConfig;
use navtrack_infra_http::HttpSettings;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "NAVTRACK";
const FALLBACK_DB_PATH: &str = "~/.navtrack/cache.db";
const MS_PER_HOUR: f64 = 3_600_000.0;
const MAX_RETENTION_DAYS: i64 = MAX_WINDOW_YEARS as i64 * DAYS_PER_YEAR;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub http: HttpSettings,
    pub cache: CacheConfig,
    pub refresh: RefreshConfig,
    pub maintenance: MaintenanceSection,
    pub analysis: AnalysisSettings,
    pub logging: LoggingConfig,
    pub funds: Vec<Fund>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            http: HttpSettings::default(),
            cache: CacheConfig::default(),
            refresh: RefreshConfig::default(),
            maintenance: MaintenanceSection::default(),
            analysis: AnalysisSettings::default(),
            logging: LoggingConfig::default(),
            funds: FundCatalog::default().funds().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `cache.refresh.v1` calls allowed back to back
    pub rate_limit_burst: u32,
    pub rate_limit_per_sec: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9630,
            rate_limit_burst: 5,
            rate_limit_per_sec: 0.2,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file; `~` is expanded. Defaults to the platform data dir.
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// 0 disables caching for reads (every request fetches live)
    pub ttl_hours: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_hours: DEFAULT_CACHE_TTL_HOURS as f64,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_hours: u64,
    pub on_startup: bool,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_hours: DEFAULT_REFRESH_INTERVAL.as_secs() / 3600,
            on_startup: true,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MaintenanceSection {
    pub interval_hours: u64,
    pub retention_days: i64,
    pub max_db_size_mb: f64,
}

impl Default for MaintenanceSection {
    fn default() -> Self {
        let defaults = MaintenanceConfig::default();
        Self {
            interval_hours: 24,
            retention_days: defaults.retention_days,
            max_db_size_mb: defaults.max_db_size_mb,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Also write daily-rotated JSON logs here
    pub directory: Option<String>,
}

impl DaemonConfig {
    /// Load defaults, `file` (or the per-user config file), then env vars
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        match file {
            Some(path) => {
                builder = builder.add_source(File::from(path.to_path_buf()).required(true));
            }
            None => {
                if let Some(path) = default_config_file() {
                    builder = builder.add_source(File::from(path).required(false));
                }
            }
        }

        Self::from_builder(builder)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        Self::from_sources(builder, env_source())
    }

    fn from_sources(builder: ConfigBuilder<DefaultState>, env: Environment) -> Result<Self> {
        let config = builder
            .add_source(env)
            .build()
            .context("Failed to read configuration")?;

        config.try_deserialize().context("Invalid configuration")
    }

    /// Reject settings the daemon cannot run with
    pub fn validate(&self) -> Result<()> {
        self.analysis.validate()?;
        self.fund_catalog()?;

        anyhow::ensure!(self.cache.ttl_hours >= 0.0, "cache.ttl_hours must be >= 0");
        anyhow::ensure!(
            (1..=MAX_INTERVAL_HOURS).contains(&self.refresh.interval_hours),
            "refresh.interval_hours must be in 1..={}",
            MAX_INTERVAL_HOURS
        );
        anyhow::ensure!(
            (1..=MAX_INTERVAL_HOURS).contains(&self.maintenance.interval_hours),
            "maintenance.interval_hours must be in 1..={}",
            MAX_INTERVAL_HOURS
        );
        anyhow::ensure!(self.refresh.max_attempts > 0, "refresh.max_attempts must be > 0");
        anyhow::ensure!(
            (1..=MAX_RETENTION_DAYS).contains(&self.maintenance.retention_days),
            "maintenance.retention_days must be in 1..={}",
            MAX_RETENTION_DAYS
        );
        anyhow::ensure!(self.http.timeout_secs > 0, "http.timeout_secs must be > 0");
        Ok(())
    }

    pub fn fund_catalog(&self) -> Result<FundCatalog> {
        FundCatalog::new(self.funds.clone()).context("Invalid fund list")
    }

    /// SQLite file path with `~` expanded
    pub fn database_path(&self) -> PathBuf {
        match &self.database.path {
            Some(path) => PathBuf::from(shellexpand::tilde(path).into_owned()),
            None => ProjectDirs::from("", "", "navtrack")
                .map(|dirs| dirs.data_dir().join("cache.db"))
                .unwrap_or_else(|| {
                    PathBuf::from(shellexpand::tilde(FALLBACK_DB_PATH).into_owned())
                }),
        }
    }

    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            ttl_ms: (self.cache.ttl_hours * MS_PER_HOUR) as i64,
            benchmark_symbol: self.analysis.benchmark_symbol.clone(),
            benchmark_years: self.analysis.history_years,
        }
    }

    pub fn maintenance_config(&self) -> MaintenanceConfig {
        MaintenanceConfig {
            retention_days: self.maintenance.retention_days,
            max_db_size_mb: self.maintenance.max_db_size_mb,
        }
    }

    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.refresh.interval_hours * 3600)
    }
}

/// `NAVTRACK_SECTION__KEY` variables, e.g. `NAVTRACK_CACHE__TTL_HOURS=6`
fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn default_config_file() -> Option<PathBuf> {
    ProjectDirs::from("", "", "navtrack").map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{FileFormat, Map};

    fn from_toml(toml: &str) -> DaemonConfig {
        let builder = Config::builder().add_source(File::from_str(toml, FileFormat::Toml));
        DaemonConfig::from_builder(builder).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = from_toml("");

        assert_eq!(config.server.port, 9630);
        assert_eq!(config.funds.len(), 3);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.cache_settings().ttl_ms, 24 * 3_600_000);
        assert_eq!(config.refresh_period(), Duration::from_secs(24 * 3600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_overrides() {
        let config = from_toml(
            r#"
            [server]
            port = 9700

            [cache]
            ttl_hours = 0

            [analysis]
            buy_alert_ratio = 0.75

            [logging]
            format = "json"

            [[funds]]
            name = "Quant Small Cap"
            code = "120828"
            "#,
        );

        assert_eq!(config.server.port, 9700);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.cache_settings().ttl_ms, 0);
        assert_eq!(config.analysis.buy_alert_ratio, 0.75);
        assert_eq!(config.analysis.table_years, 2);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.fund_catalog().unwrap().len(), 1);
    }

    #[test]
    fn test_env_overrides_file_and_defaults() {
        let vars: Map<String, String> = [
            ("NAVTRACK_SERVER__PORT", "9800"),
            ("NAVTRACK_CACHE__TTL_HOURS", "6"),
            ("NAVTRACK_REFRESH__ON_STARTUP", "false"),
            ("OTHER_SERVER__PORT", "1"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let file = File::from_str(
            r#"
            [server]
            port = 9700
            host = "0.0.0.0"

            [cache]
            ttl_hours = 12
            "#,
            FileFormat::Toml,
        );
        let config = DaemonConfig::from_sources(
            Config::builder().add_source(file),
            env_source().source(Some(vars)),
        )
        .unwrap();

        assert_eq!(config.server.port, 9800);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.cache_settings().ttl_ms, 6 * 3_600_000);
        assert!(!config.refresh.on_startup);
        assert_eq!(config.refresh.interval_hours, 24);
    }

    #[test]
    fn test_invalid_scheme_code_rejected() {
        let result = DaemonConfig::from_builder(Config::builder().add_source(File::from_str(
            r#"
            [[funds]]
            name = "Broken"
            code = "12AB"
            "#,
            FileFormat::Toml,
        )));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_duplicates_and_bad_windows() {
        let mut config = DaemonConfig::default();
        config.funds.push(config.funds[0].clone());
        assert!(config.validate().is_err());

        let mut config = DaemonConfig::default();
        config.refresh.interval_hours = 0;
        assert!(config.validate().is_err());

        let mut config = DaemonConfig::default();
        config.analysis.table_years = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        let mut config = DaemonConfig::default();
        config.analysis.history_years = 300_000;
        assert!(config.validate().is_err());

        let mut config = DaemonConfig::default();
        config.refresh.interval_hours = MAX_INTERVAL_HOURS + 1;
        assert!(config.validate().is_err());

        let mut config = DaemonConfig::default();
        config.maintenance.interval_hours = u64::MAX;
        assert!(config.validate().is_err());

        let mut config = DaemonConfig::default();
        config.maintenance.retention_days = i64::MAX;
        assert!(config.validate().is_err());

        let mut config = DaemonConfig::default();
        config.refresh.interval_hours = MAX_INTERVAL_HOURS;
        config.maintenance.interval_hours = MAX_INTERVAL_HOURS;
        config.maintenance.retention_days = MAX_RETENTION_DAYS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_database_path_expands_tilde() {
        let mut config = DaemonConfig::default();
        config.database.path = Some("~/navtrack-test/cache.db".into());
        let path = config.database_path();
        assert!(!path.to_string_lossy().starts_with('~'));
        assert!(path.ends_with("navtrack-test/cache.db"));
    }
}
