//! Application configuration structures.

use std::fs;
use std::path::Path;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{ColumnLayout, UserZone};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Where and how the feed is fetched
    #[serde(default)]
    pub feed: FeedConfig,

    /// Refresh timer settings
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Last-known-good snapshot settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Console list settings
    #[serde(default)]
    pub display: DisplayConfig,

    /// Relay endpoint settings
    #[serde(default)]
    pub relay: RelayConfig,

    /// Fixed-width parser settings
    #[serde(default)]
    pub parser: ParserConfig,

    /// User watch zones
    #[serde(default)]
    pub zones: Vec<UserZone>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.feed.user_agent.trim().is_empty() {
            return Err(AppError::validation("feed.user_agent is empty"));
        }
        if self.feed.timeout_secs == 0 {
            return Err(AppError::validation("feed.timeout_secs must be > 0"));
        }
        url::Url::parse(&self.feed.relay_url)
            .map_err(|e| AppError::validation(format!("feed.relay_url: {e}")))?;
        url::Url::parse(&self.feed.upstream_url)
            .map_err(|e| AppError::validation(format!("feed.upstream_url: {e}")))?;
        self.feed.tz()?;
        if self.refresh.interval_secs == 0 {
            return Err(AppError::validation("refresh.interval_secs must be > 0"));
        }
        if self.cache.path.trim().is_empty() {
            return Err(AppError::validation("cache.path is empty"));
        }
        if self.display.max_items == 0 {
            return Err(AppError::validation("display.max_items must be > 0"));
        }
        self.relay
            .bind
            .parse::<std::net::SocketAddr>()
            .map_err(|e| AppError::validation(format!("relay.bind: {e}")))?;
        self.parser.layout.validate()?;
        for zone in &self.zones {
            if zone.radius_km <= 0.0 {
                return Err(AppError::validation(format!(
                    "zone '{}' must have a positive radius",
                    zone.name
                )));
            }
        }
        Ok(())
    }
}

/// How the raw feed is obtained.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeedSource {
    /// Through the same-origin relay endpoint
    #[default]
    Relay,
    /// Straight from the upstream provider, relay logic in-process
    Direct,
}

/// Feed source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default)]
    pub source: FeedSource,

    /// Relay endpoint returning the JSON envelope
    #[serde(default = "defaults::relay_url")]
    pub relay_url: String,

    /// Upstream fixed-width report page
    #[serde(default = "defaults::upstream_url")]
    pub upstream_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// IANA zone the feed's wall-clock times are expressed in
    #[serde(default = "defaults::timezone")]
    pub timezone: String,
}

impl FeedConfig {
    /// Parse the configured feed time zone.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| AppError::config(format!("feed.timezone '{}': {e}", self.timezone)))
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            source: FeedSource::default(),
            relay_url: defaults::relay_url(),
            upstream_url: defaults::upstream_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            timezone: defaults::timezone(),
        }
    }
}

/// Refresh timer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Seconds between timer-driven refreshes
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
        }
    }
}

/// Snapshot cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Snapshot file location
    #[serde(default = "defaults::cache_path")]
    pub path: String,

    /// Keep the snapshot in memory only
    #[serde(default)]
    pub in_memory: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: defaults::cache_path(),
            in_memory: false,
        }
    }
}

/// A fixed observer position for distance display.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Observer {
    pub lat: f64,
    pub lng: f64,
}

/// Console list settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Events below this magnitude are hidden
    #[serde(default)]
    pub min_magnitude: f64,

    /// Maximum number of events listed
    #[serde(default = "defaults::max_items")]
    pub max_items: usize,

    /// Show distances from this point when set
    #[serde(default)]
    pub observer: Option<Observer>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            min_magnitude: 0.0,
            max_items: defaults::max_items(),
            observer: None,
        }
    }
}

/// Relay endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Socket address the relay listens on
    #[serde(default = "defaults::bind")]
    pub bind: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: defaults::bind(),
        }
    }
}

/// Parser settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ParserConfig {
    #[serde(default)]
    pub layout: ColumnLayout,
}

mod defaults {
    // Feed defaults
    pub fn relay_url() -> String {
        "http://127.0.0.1:8080/relay".into()
    }
    pub fn upstream_url() -> String {
        "http://www.koeri.boun.edu.tr/scripts/lst4.asp".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; sismiq/0.1)".into()
    }
    pub fn timeout() -> u64 {
        20
    }
    pub fn timezone() -> String {
        "Europe/Istanbul".into()
    }

    // Refresh defaults
    pub fn interval() -> u64 {
        60
    }

    // Cache defaults
    pub fn cache_path() -> String {
        "storage/last_quakes.json".into()
    }

    // Display defaults
    pub fn max_items() -> usize {
        10
    }

    // Relay defaults
    pub fn bind() -> String {
        "127.0.0.1:8080".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.feed.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let mut config = Config::default();
        config.refresh.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_timezone() {
        let mut config = Config::default();
        config.feed.timezone = "Mars/Olympus".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_zone_radius() {
        let mut config = Config::default();
        config.zones.push(UserZone {
            name: "Home".to_string(),
            lat: 41.0,
            lng: 29.0,
            radius_km: 0.0,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn parse_partial_toml_keeps_defaults() {
        let toml = r#"
            [feed]
            source = "direct"

            [refresh]
            interval_secs = 120

            [[zones]]
            name = "Home"
            lat = 41.0
            lng = 29.0
            radius_km = 100.0
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.feed.source, FeedSource::Direct);
        assert_eq!(config.feed.timezone, "Europe/Istanbul");
        assert_eq!(config.refresh.interval_secs, 120);
        assert_eq!(config.display.max_items, 10);
        assert_eq!(config.zones.len(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_or_default_on_missing_file() {
        let config = Config::load_or_default("/nonexistent/sismiq.toml");
        assert_eq!(config.refresh.interval_secs, 60);
    }
}
