//! Application configuration.
//!
//! Aggregates storage and report settings into a single Config struct
//! that can be loaded from YAML files or environment variables.

mod report;
mod storage;

pub use report::{Clock, ReportConfig};
pub use storage::{StorageConfig, DEFAULT_DATABASE_PATH, DEFAULT_MAX_CONNECTIONS};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "RENTAL_REPORT_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "RENTAL_REPORT";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "RENTAL_REPORT_LOG";

use serde::Deserialize;

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Report run configuration.
    pub report: ReportConfig,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `config.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix
    pub fn load(path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        Ok(config)
    }

    /// Create config for testing: in-memory database, UTC clock.
    pub fn for_test() -> Self {
        Self {
            storage: StorageConfig {
                path: crate::storage::IN_MEMORY_PATH.to_string(),
                max_connections: 1,
            },
            report: ReportConfig {
                clock: Clock::Utc,
                audit_after_refresh: true,
            },
        }
    }
}
