//! Process configuration.
//!
//! Settings come from a JSON file (`config.json` by default, or the path
//! in `PLAYWATCH_CONFIG`), then a handful of environment variables
//! override individual fields. Every field has a default, so a missing
//! file is not an error.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use playwatch_presence::{PresenceConfig, DEFAULT_EVENT_LOG_CAPACITY};
use serde::{Deserialize, Serialize};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "PLAYWATCH_CONFIG";

/// Config file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for [`PlaywatchConfig`].
    #[error("failed to parse config: {source}")]
    Parse {
        #[from]
        source: serde_json::Error,
    },

    /// An environment override could not be parsed.
    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    /// `eventSource` is `feed` but no `feed.url` was given.
    #[error("event source is \"feed\" but feed.url is not set")]
    MissingFeedUrl,
}

/// Where events come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSourceKind {
    /// Only `POST /api/events`.
    #[default]
    Http,
    /// A WebSocket feed subscription, in addition to HTTP push.
    Feed,
}

impl fmt::Display for EventSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => f.write_str("http"),
            Self::Feed => f.write_str("feed"),
        }
    }
}

/// Log verbosity when `RUST_LOG` is not set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugLevel {
    Error,
    #[default]
    Info,
    Debug,
}

impl DebugLevel {
    /// The `EnvFilter` directive for this level.
    pub fn as_filter(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

/// Feed subscription settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedConfig {
    /// `ws://` or `wss://` URL of the event feed.
    pub url: Option<String>,
    /// Pause between a lost connection and the next attempt.
    pub reconnect_delay_ms: u64,
    /// Upper bound on a single connection attempt.
    pub connect_timeout_ms: u64,
}

impl FeedConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: None,
            reconnect_delay_ms: 5_000,
            connect_timeout_ms: 10_000,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaywatchConfig {
    pub host: String,
    pub port: u16,
    /// Snapshot file location.
    pub data_file: PathBuf,
    pub event_source: EventSourceKind,
    pub feed: FeedConfig,
    pub debug_level: DebugLevel,
    /// How long a computed player list may be served before live
    /// session times are recomputed.
    pub staleness_window_ms: u64,
    /// How many accepted events `GET /api/events` can return.
    pub event_log_capacity: usize,
    /// Opaque display settings, served verbatim by `GET /api/config`.
    pub ui: serde_json::Value,
}

impl Default for PlaywatchConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 3001,
            data_file: PathBuf::from("data/player-data.json"),
            event_source: EventSourceKind::default(),
            feed: FeedConfig::default(),
            debug_level: DebugLevel::default(),
            staleness_window_ms: 5_000,
            event_log_capacity: DEFAULT_EVENT_LOG_CAPACITY,
            ui: serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}

/// Where a loaded configuration came from.
///
/// Loading happens before the tracing subscriber exists (the log level is
/// part of the config), so the caller logs this once tracing is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// Read from this file.
    File(PathBuf),
    /// This file did not exist; defaults were used.
    Defaults(PathBuf),
}

impl ConfigOrigin {
    pub fn log(&self) {
        match self {
            Self::File(path) => tracing::info!(path = %path.display(), "config loaded"),
            Self::Defaults(path) => {
                tracing::info!(path = %path.display(), "config file not found, using defaults")
            }
        }
    }
}

impl PlaywatchConfig {
    /// Loads the config file named by `PLAYWATCH_CONFIG` (or
    /// `config.json`) and applies environment overrides.
    ///
    /// # Errors
    /// See [`from_file`](Self::from_file) and
    /// [`apply_env_overrides`](Self::apply_env_overrides).
    pub fn load() -> Result<(Self, ConfigOrigin), ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let (mut config, origin) = Self::from_file(&path)?;
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok((config, origin))
    }

    /// Reads a config file. A file that does not exist yields defaults.
    ///
    /// # Errors
    /// [`ConfigError::Io`] if the file exists but cannot be read,
    /// [`ConfigError::Parse`] if it is not valid.
    pub fn from_file(path: &Path) -> Result<(Self, ConfigOrigin), ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok((Self::parse(&contents)?, ConfigOrigin::File(path.to_path_buf()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok((Self::default(), ConfigOrigin::Defaults(path.to_path_buf())))
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Parses configuration from a JSON string.
    ///
    /// # Errors
    /// [`ConfigError::Parse`] if the string is not a valid config.
    pub fn parse(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Overrides fields from the environment. `lookup` is usually
    /// `std::env::var(..).ok()`.
    ///
    /// Recognized: `PORT`, `PLAYWATCH_DATA_FILE`, `PLAYWATCH_EVENT_SOURCE`,
    /// `PLAYWATCH_FEED_URL`, `PLAYWATCH_DEBUG_LEVEL`.
    ///
    /// # Errors
    /// [`ConfigError::InvalidEnv`] if a value does not parse.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup("PORT") {
            self.port = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: "PORT",
                value,
            })?;
        }
        if let Some(value) = lookup("PLAYWATCH_DATA_FILE") {
            self.data_file = PathBuf::from(value);
        }
        if let Some(value) = lookup("PLAYWATCH_EVENT_SOURCE") {
            self.event_source = parse_enum("PLAYWATCH_EVENT_SOURCE", value)?;
        }
        if let Some(value) = lookup("PLAYWATCH_FEED_URL") {
            self.feed.url = Some(value);
        }
        if let Some(value) = lookup("PLAYWATCH_DEBUG_LEVEL") {
            self.debug_level = parse_enum("PLAYWATCH_DEBUG_LEVEL", value)?;
        }
        Ok(())
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    /// [`ConfigError::MissingFeedUrl`] if the feed source has no URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.event_source == EventSourceKind::Feed && self.feed.url.is_none() {
            return Err(ConfigError::MissingFeedUrl);
        }
        Ok(())
    }

    /// The `host:port` string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn presence(&self) -> PresenceConfig {
        PresenceConfig::with_window(Duration::from_millis(self.staleness_window_ms))
    }
}

/// Parses a lowercase enum name through serde so the accepted spellings
/// match the config file.
fn parse_enum<T: serde::de::DeserializeOwned>(
    name: &'static str,
    value: String,
) -> Result<T, ConfigError> {
    let normalized = value.trim().to_ascii_lowercase();
    serde_json::from_value(serde_json::Value::String(normalized))
        .map_err(|_| ConfigError::InvalidEnv { name, value })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_matches_documented_values() {
        let config = PlaywatchConfig::default();
        assert_eq!(config.port, 3001);
        assert_eq!(config.data_file, PathBuf::from("data/player-data.json"));
        assert_eq!(config.event_source, EventSourceKind::Http);
        assert_eq!(config.feed.reconnect_delay_ms, 5_000);
        assert_eq!(config.staleness_window_ms, 5_000);
        assert_eq!(config.ui, serde_json::json!({}));
    }

    #[test]
    fn test_parse_partial_file_fills_defaults() {
        let config = PlaywatchConfig::parse(
            r#"{
                "port": 8080,
                "eventSource": "feed",
                "feed": { "url": "ws://broker:9001/events" },
                "debugLevel": "debug",
                "ui": { "title": "My Server" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.event_source, EventSourceKind::Feed);
        assert_eq!(config.feed.url.as_deref(), Some("ws://broker:9001/events"));
        assert_eq!(config.feed.reconnect_delay_ms, 5_000);
        assert_eq!(config.debug_level, DebugLevel::Debug);
        assert_eq!(config.ui["title"], "My Server");
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_parse_invalid_json_returns_parse_error() {
        let result = PlaywatchConfig::parse("{ port: ");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_from_file_missing_returns_defaults_origin() {
        let path = Path::new("/nonexistent/playwatch.json");

        let (config, origin) = PlaywatchConfig::from_file(path).unwrap();

        assert_eq!(config, PlaywatchConfig::default());
        assert_eq!(origin, ConfigOrigin::Defaults(path.to_path_buf()));
    }

    #[test]
    fn test_from_file_existing_reports_file_origin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "port": 4010 }"#).unwrap();

        let (config, origin) = PlaywatchConfig::from_file(&path).unwrap();

        assert_eq!(config.port, 4010);
        assert_eq!(origin, ConfigOrigin::File(path));
    }

    #[test]
    fn test_apply_env_overrides_replaces_fields() {
        let mut config = PlaywatchConfig::default();
        config
            .apply_env_overrides(env(&[
                ("PORT", "4000"),
                ("PLAYWATCH_DATA_FILE", "/var/lib/playwatch/players.json"),
                ("PLAYWATCH_EVENT_SOURCE", "Feed"),
                ("PLAYWATCH_FEED_URL", "ws://localhost:9001"),
                ("PLAYWATCH_DEBUG_LEVEL", "error"),
            ]))
            .unwrap();

        assert_eq!(config.port, 4000);
        assert_eq!(config.data_file, PathBuf::from("/var/lib/playwatch/players.json"));
        assert_eq!(config.event_source, EventSourceKind::Feed);
        assert_eq!(config.feed.url.as_deref(), Some("ws://localhost:9001"));
        assert_eq!(config.debug_level, DebugLevel::Error);
    }

    #[test]
    fn test_apply_env_overrides_bad_port_returns_error() {
        let mut config = PlaywatchConfig::default();
        let result = config.apply_env_overrides(env(&[("PORT", "not-a-port")]));
        assert!(matches!(result, Err(ConfigError::InvalidEnv { name: "PORT", .. })));
    }

    #[test]
    fn test_apply_env_overrides_unknown_source_returns_error() {
        let mut config = PlaywatchConfig::default();
        let result = config.apply_env_overrides(env(&[("PLAYWATCH_EVENT_SOURCE", "mqtt")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnv { name: "PLAYWATCH_EVENT_SOURCE", .. })
        ));
    }

    #[test]
    fn test_validate_feed_without_url_fails() {
        let config = PlaywatchConfig {
            event_source: EventSourceKind::Feed,
            ..PlaywatchConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::MissingFeedUrl)));
    }

    #[test]
    fn test_presence_uses_staleness_window() {
        let config = PlaywatchConfig {
            staleness_window_ms: 250,
            ..PlaywatchConfig::default()
        };
        assert_eq!(config.presence().staleness_window, Duration::from_millis(250));
    }
}
