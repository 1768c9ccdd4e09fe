use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::dataset::ReviewTable;
use crate::error::RevueError;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RevueConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub trends: TrendsConfig,
    #[serde(default)]
    pub topics: TopicsConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub socket_path: String,
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            socket_path: "/tmp/revue.sock".to_string(),
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatasetConfig {
    /// Fallback CSV used when no dataset is passed on the command line
    pub default_path: String,
    /// Number of leading rows returned as "sample reviews"
    pub sample_rows: usize,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            default_path: "data/music_sample.csv".to_string(),
            sample_rows: 5,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrendsConfig {
    pub recent_months: usize,
}

impl Default for TrendsConfig {
    fn default() -> Self {
        Self { recent_months: 6 }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TopicsConfig {
    pub samples_per_issue: usize,
}

impl Default for TopicsConfig {
    fn default() -> Self {
        Self {
            samples_per_issue: 3,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8770,
        }
    }
}

impl RevueConfig {
    /// Load from a TOML file, with `REVUE__SECTION__KEY` environment overrides.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("REVUE").separator("__"))
            .build()?;
        s.try_deserialize()
    }
}

/// Load the config file and the dataset it points at.
///
/// `dataset` overrides `dataset.default_path` when given.
pub fn load_dashboard(
    config_path: &str,
    dataset: Option<&str>,
) -> Result<(RevueConfig, ReviewTable), RevueError> {
    let config = RevueConfig::load(config_path)?;
    let path = dataset.unwrap_or(&config.dataset.default_path);
    let table = ReviewTable::load(path)?;
    Ok((config, table))
}
