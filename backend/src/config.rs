//! Configuration management for the WaveGuard platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with WAVEGUARD__ prefix

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::cyclone::CycloneScoringTable;
use shared::{Location, ValidationError, DEFAULT_ALERT_THRESHOLD};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Log output: "pretty" or "json"
    pub log_format: String,

    pub server: ServerConfig,

    pub database: DatabaseConfig,

    pub weather: WeatherConfig,

    pub usgs: UsgsConfig,

    pub models: ModelsConfig,

    pub alerts: AlertsConfig,

    pub monitor: MonitorConfig,

    /// Cyclone scoring overrides; unspecified fields keep their defaults
    #[serde(default)]
    pub cyclone: CycloneScoringTable,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL; the alert log falls back to a file without it
    pub url: Option<String>,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WeatherProvider {
    /// OpenWeatherMap
    Live,
    /// Seeded random conditions
    Simulated,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    pub provider: WeatherProvider,

    /// OpenWeatherMap API key
    pub api_key: Option<String>,

    /// OpenWeatherMap API base URL
    pub base_url: String,

    /// Seed for the simulated provider
    pub simulation_seed: Option<u64>,

    /// Days of forecast used for the current-month rainfall estimate
    pub forecast_days: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UsgsConfig {
    /// Base URL of the GeoJSON summary feeds
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelsConfig {
    /// Directory holding `<hazard>.json` model descriptors
    pub directory: PathBuf,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertLogBackend {
    File,
    Postgres,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AlertsConfig {
    pub backend: AlertLogBackend,

    /// JSON-lines alert log path (file backend)
    pub log_path: PathBuf,

    /// Webhook receiving dispatched alerts; alerts are only logged without it
    pub webhook_url: Option<String>,

    /// Shared secret for the `X-WaveGuard-Signature` header
    pub webhook_secret: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MonitorConfig {
    /// Run the scheduled monitor alongside the HTTP server
    pub enabled: bool,

    /// Upstream fetch timeout in seconds
    pub fetch_timeout_secs: u64,

    /// Alert threshold for locations that do not set one
    pub default_threshold: f64,

    /// Locations as written in the configuration sources
    #[serde(default, rename = "locations")]
    entries: Vec<LocationEntry>,

    /// Monitored locations with every threshold resolved
    #[serde(skip)]
    pub locations: Vec<Location>,
}

/// A configured location whose threshold may be left unset
#[derive(Debug, Deserialize, Clone)]
struct LocationEntry {
    #[serde(flatten)]
    location: Location,
    alert_threshold: Option<f64>,
}

impl MonitorConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Locations without an explicit threshold take `default_threshold`
    fn resolve_locations(&mut self) {
        let default = self.default_threshold;
        self.locations = self
            .entries
            .drain(..)
            .map(|entry| Location {
                alert_threshold: entry.alert_threshold.unwrap_or(default),
                ..entry.location
            })
            .collect();
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, reading `path` instead of `config/<environment>`
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let environment =
            std::env::var("WAVEGUARD_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(&format!("config/{}", environment)).required(false),
        };

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("log_format", "pretty")?
            .set_default("server.port", 8000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("weather.provider", "live")?
            .set_default("weather.base_url", "https://api.openweathermap.org/data/2.5")?
            .set_default("weather.forecast_days", 5)?
            .set_default(
                "usgs.base_url",
                "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary",
            )?
            .set_default("models.directory", "models")?
            .set_default("alerts.backend", "file")?
            .set_default("alerts.log_path", "waveguard_alerts.jsonl")?
            .set_default("monitor.enabled", false)?
            .set_default("monitor.fetch_timeout_secs", 10)?
            .set_default("monitor.default_threshold", DEFAULT_ALERT_THRESHOLD)?
            .add_source(file)
            // Override with environment variables (WAVEGUARD__ prefix)
            .add_source(
                Environment::with_prefix("WAVEGUARD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: Config = config.try_deserialize()?;
        config.monitor.resolve_locations();
        Ok(config)
    }

    /// Reject configurations the monitor cannot run with
    pub fn validate(&self) -> Result<(), ValidationError> {
        shared::validate_alert_threshold(self.monitor.default_threshold)?;
        for location in &self.monitor.locations {
            location.validate()?;
        }
        if self.weather.provider == WeatherProvider::Live && self.weather.api_key.is_none() {
            return Err(ValidationError::new(
                "weather.api_key",
                "A weather API key is required for the live provider",
            ));
        }
        if self.alerts.backend == AlertLogBackend::Postgres && self.database.url.is_none() {
            return Err(ValidationError::new(
                "database.url",
                "The postgres alert log requires a database URL",
            ));
        }
        Ok(())
    }
}

/// Example configuration printed by `waveguard-monitor --print-sample-config`
pub const SAMPLE_CONFIG: &str = r#"log_format = "pretty"

[weather]
provider = "live"
# api_key = "your-openweathermap-key"

[alerts]
backend = "file"
log_path = "waveguard_alerts.jsonl"
# webhook_url = "https://example.org/api/alerts"
# webhook_secret = "change-me"

[monitor]
enabled = true
fetch_timeout_secs = 10
default_threshold = 0.64

[[monitor.locations]]
name = "Mumbai, India"
latitude = 19.0760
longitude = 72.8777
poll_interval_secs = 3600
hazards = ["flood", "cyclone"]

[[monitor.locations]]
name = "Houston, TX"
latitude = 29.7604
longitude = -95.3698
hazards = ["flood", "cyclone"]

[[monitor.locations]]
name = "Venice, Italy"
latitude = 45.4408
longitude = 12.3155
hazards = ["flood"]
"#;
