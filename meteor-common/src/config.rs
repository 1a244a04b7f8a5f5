//! Configuration loading and config file resolution
//!
//! Every setting has a compiled default, so a missing TOML file is not an
//! error: the loader logs a warning and carries on with defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "METEOR_CONFIG";

/// data.gov.sg traffic images endpoint
pub const DEFAULT_TRAFFIC_URL: &str = "https://api.data.gov.sg/v1/transport/traffic-images";
/// data.gov.sg 2-hour weather forecast endpoint
pub const DEFAULT_WEATHER_URL: &str =
    "https://api.data.gov.sg/v1/environment/2-hour-weather-forecast";
/// positionstack reverse geocoding endpoint
pub const DEFAULT_GEOCODE_URL: &str = "http://api.positionstack.com/v1/reverse";

/// Full TOML configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub apis: ApiConfig,
    pub geo_join: GeoJoinConfig,
    pub logging: LoggingConfig,
}

/// `[server]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5780,
        }
    }
}

/// `[apis]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub traffic_url: String,
    pub weather_url: String,
    pub geocode_url: String,
    /// positionstack access key; reverse geocoding is disabled without one
    pub geocode_api_key: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            traffic_url: DEFAULT_TRAFFIC_URL.to_string(),
            weather_url: DEFAULT_WEATHER_URL.to_string(),
            geocode_url: DEFAULT_GEOCODE_URL.to_string(),
            geocode_api_key: None,
            request_timeout_secs: 30,
        }
    }
}

/// Which proximity rule the geo-join applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategyKind {
    /// Closest label point within the tolerance box
    #[default]
    Nearest,
    /// Camera strictly north-east of the label point, last match wins
    Literal,
}

/// `[geo_join]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoJoinConfig {
    pub strategy: MatchStrategyKind,
    /// Per-axis bound in decimal degrees
    pub tolerance: f64,
}

impl Default for GeoJoinConfig {
    fn default() -> Self {
        Self {
            strategy: MatchStrategyKind::Nearest,
            tolerance: 0.0001,
        }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing directive when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot check
    pub fn validate(&self) -> Result<()> {
        if !(self.geo_join.tolerance.is_finite() && self.geo_join.tolerance > 0.0) {
            return Err(Error::Config(format!(
                "geo_join.tolerance must be a positive number, got {}",
                self.geo_join.tolerance
            )));
        }
        if self.apis.request_timeout_secs == 0 {
            return Err(Error::Config(
                "apis.request_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Config file resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. `METEOR_CONFIG` environment variable
/// 3. Platform config directory (`<config dir>/meteor/config.toml`)
///
/// Returns `None` when no candidate can be determined.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path()
}

/// Platform default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("meteor").join("config.toml"))
}

/// Load configuration from a TOML file
///
/// A missing file yields defaults plus a warning. An unreadable or invalid
/// file is an error.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path else {
        warn!("No config file location available, using defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!("Config file {} not found, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config = TomlConfig::from_toml_str(&content)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}
