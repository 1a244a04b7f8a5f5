//! Settings resolution for meteor-app
//!
//! Each setting resolves with priority: command line / environment (both
//! handled by clap) -> TOML file -> compiled default.

use meteor_common::config::{MatchStrategyKind, TomlConfig};
use tracing::{info, warn};

use crate::enrichment::MatchStrategy;

/// Values given on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub geocode_api_key: Option<String>,
    pub literal_match: bool,
}

/// Fully resolved settings
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub geocode_api_key: Option<String>,
    pub strategy: MatchStrategy,
    pub toml: TomlConfig,
}

impl AppConfig {
    pub fn resolve(toml: TomlConfig, overrides: Overrides) -> Self {
        let geocode_api_key =
            resolve_geocode_api_key(overrides.geocode_api_key.as_deref(), &toml);

        let mut geo_join = toml.geo_join.clone();
        if overrides.literal_match {
            geo_join.strategy = MatchStrategyKind::Literal;
        }

        Self {
            host: overrides.host.unwrap_or_else(|| toml.server.host.clone()),
            port: overrides.port.unwrap_or(toml.server.port),
            geocode_api_key,
            strategy: MatchStrategy::from(&geo_join),
            toml,
        }
    }

    /// Socket address to bind
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Default tracing filter: command line/environment, then TOML
///
/// Needed before `AppConfig::resolve` so that its warnings are logged.
pub fn resolve_log_level(cli_or_env: Option<&str>, toml: &TomlConfig) -> String {
    cli_or_env
        .filter(|level| !level.trim().is_empty())
        .map(|level| level.trim().to_string())
        .unwrap_or_else(|| toml.logging.level.clone())
}

/// Resolve the positionstack key from command line/environment, then TOML
///
/// Returns `None` when no valid key is configured; reverse geocoding is then
/// disabled.
pub fn resolve_geocode_api_key(cli_or_env: Option<&str>, toml: &TomlConfig) -> Option<String> {
    let cli_key = cli_or_env.filter(|k| is_valid_key(k));
    let toml_key = toml
        .apis
        .geocode_api_key
        .as_deref()
        .filter(|k| is_valid_key(k));

    if cli_key.is_some() && toml_key.is_some() {
        warn!("Geocoding API key found in multiple sources: command line/environment, TOML. Using command line/environment.");
    }

    if let Some(key) = cli_key {
        info!("Geocoding API key loaded from command line/environment");
        return Some(key.trim().to_string());
    }

    if let Some(key) = toml_key {
        info!("Geocoding API key loaded from TOML config");
        return Some(key.trim().to_string());
    }

    warn!(
        "Geocoding API key not configured; street names will not be resolved. \
         Set METEOR_GEOCODE_API_KEY or apis.geocode_api_key in the config file."
    );
    None
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toml_with_key(key: Option<&str>) -> TomlConfig {
        let mut toml = TomlConfig::default();
        toml.apis.geocode_api_key = key.map(str::to_string);
        toml
    }

    #[test]
    fn test_key_priority() {
        assert_eq!(
            resolve_geocode_api_key(Some("cli"), &toml_with_key(Some("file"))).as_deref(),
            Some("cli")
        );
        assert_eq!(
            resolve_geocode_api_key(None, &toml_with_key(Some("file"))).as_deref(),
            Some("file")
        );
        assert_eq!(resolve_geocode_api_key(None, &toml_with_key(None)), None);
    }

    #[test]
    fn test_blank_key_ignored() {
        assert_eq!(
            resolve_geocode_api_key(Some("   "), &toml_with_key(Some("file"))).as_deref(),
            Some("file")
        );
        assert_eq!(resolve_geocode_api_key(None, &toml_with_key(Some(""))), None);
    }

    #[test]
    fn test_overrides_beat_toml() {
        let config = AppConfig::resolve(
            TomlConfig::default(),
            Overrides {
                host: Some("0.0.0.0".to_string()),
                port: Some(9999),
                literal_match: true,
                ..Default::default()
            },
        );

        assert_eq!(config.bind_addr(), "0.0.0.0:9999");
        assert_eq!(config.strategy, MatchStrategy::Literal { tolerance: 0.0001 });
    }

    #[test]
    fn test_log_level_priority() {
        let mut toml = TomlConfig::default();
        assert_eq!(resolve_log_level(None, &toml), "info");

        toml.logging.level = "meteor_app=debug".to_string();
        assert_eq!(resolve_log_level(None, &toml), "meteor_app=debug");
        assert_eq!(resolve_log_level(Some("warn"), &toml), "warn");
        assert_eq!(resolve_log_level(Some("  "), &toml), "meteor_app=debug");
    }

    #[test]
    fn test_defaults_from_toml() {
        let config = AppConfig::resolve(TomlConfig::default(), Overrides::default());

        assert_eq!(config.bind_addr(), "127.0.0.1:5780");
        assert_eq!(config.strategy, MatchStrategy::Nearest { tolerance: 0.0001 });
        assert!(config.geocode_api_key.is_none());
    }
}
