use std::str::FromStr;

use serde::Deserialize;

use crate::rollup::DrainMode;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub rollup: RollupConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_pool_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RollupConfig {
    #[serde(default = "default_rollup_enabled")]
    pub enabled: bool,
    /// Cron expression, seconds first (e.g. "0 */2 * * * *"). Evaluated in local time.
    pub schedule: String,
    /// When set, only these stats are written to history. Absent = every stat.
    #[serde(default)]
    pub allow_listed_stats: Option<Vec<String>>,
    #[serde(default)]
    pub drain_mode: DrainMode,
}

fn default_rollup_enabled() -> bool {
    true
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            self.database.max_pool_size > 0,
            "database.max_pool_size must be > 0, got {}",
            self.database.max_pool_size
        );
        if let Err(e) = cron::Schedule::from_str(&self.rollup.schedule) {
            anyhow::bail!(
                "rollup.schedule is not a valid cron expression ({:?}): {}",
                self.rollup.schedule,
                e
            );
        }
        if let Some(stats) = &self.rollup.allow_listed_stats {
            anyhow::ensure!(
                stats.iter().all(|s| !s.is_empty()),
                "rollup.allow_listed_stats must not contain empty names"
            );
        }
        Ok(())
    }
}
