//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Time handling configuration.
    #[serde(default)]
    pub time: TimeConfig,
    /// Event policy configuration.
    #[serde(default)]
    pub events: EventsConfig,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Time handling configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeConfig {
    /// Canonical IANA timezone all wall-clock input is interpreted in.
    #[serde(default = "default_timezone")]
    pub canonical_timezone: String,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            canonical_timezone: default_timezone(),
        }
    }
}

/// Event policy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    /// How many years into the future an event may be scheduled.
    #[serde(default = "default_max_future_years")]
    pub max_future_years: i32,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            max_future_years: default_max_future_years(),
        }
    }
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

fn default_timezone() -> String {
    "America/Los_Angeles".to_string()
}

const fn default_max_future_years() -> i32 {
    10
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `VOTEHALL_ENV`)
    /// 3. Environment variables with `VOTEHALL_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("VOTEHALL_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("VOTEHALL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("VOTEHALL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
