//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::{ApiConfig, RESERVED_PATHS};
use crate::broker::{validate_topic_name, RouterConfig};
use crate::mqtt::DEFAULT_MAX_PACKET_SIZE;
use crate::session::SessionConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub broker: BrokerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Empty means any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

/// Broker, transport and topic configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    #[serde(default = "default_transport_path")]
    pub transport_path: String,

    #[serde(default = "default_status_topic")]
    pub status_topic: String,

    #[serde(default = "default_command_topic")]
    pub command_topic: String,

    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,

    #[serde(default = "default_write_timeout")]
    pub write_timeout_ms: u64,

    #[serde(default = "default_outbound_capacity")]
    pub outbound_capacity: usize,

    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    #[serde(default = "default_max_packet_size")]
    pub max_packet_size: usize,

    #[serde(default = "default_max_retained")]
    pub max_retained: usize,
}

fn default_transport_path() -> String {
    "/mqtt".to_string()
}

fn default_status_topic() -> String {
    "devices/status".to_string()
}

fn default_command_topic() -> String {
    "devices/command".to_string()
}

fn default_keep_alive() -> u64 {
    90
}

fn default_write_timeout() -> u64 {
    5000
}

fn default_outbound_capacity() -> usize {
    256
}

fn default_max_connections() -> usize {
    1000
}

fn default_max_packet_size() -> usize {
    DEFAULT_MAX_PACKET_SIZE
}

fn default_max_retained() -> usize {
    10_000
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            transport_path: default_transport_path(),
            status_topic: default_status_topic(),
            command_topic: default_command_topic(),
            keep_alive_secs: default_keep_alive(),
            write_timeout_ms: default_write_timeout(),
            outbound_capacity: default_outbound_capacity(),
            max_connections: default_max_connections(),
            max_packet_size: default_max_packet_size(),
            max_retained: default_max_retained(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from default locations or environment
    ///
    /// The first config file that exists is used. A file that exists but
    /// cannot be read or parsed is an error, not a fallback to defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load_first(&default_config_paths())
    }

    /// First default config file that exists
    pub fn locate_default() -> Option<PathBuf> {
        default_config_paths().into_iter().find(|path| path.exists())
    }

    fn load_first(candidates: &[PathBuf]) -> Result<Self, ConfigError> {
        match candidates.iter().find(|path| path.exists()) {
            Some(path) => Self::load_with_env(path),
            None => Ok(Self::from_env()),
        }
    }

    /// Apply environment overrides read through `lookup`
    ///
    /// `FIELDLINK_*` names win over the plain names hosting platforms set.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |names: &[&str]| names.iter().find_map(|name| lookup(name));

        if let Some(host) = var(&["FIELDLINK_HOST", "HOST"]) {
            self.server.host = host;
        }
        if let Some(port) = var(&["FIELDLINK_PORT", "PORT"]) {
            match port.parse() {
                Ok(p) => self.server.port = p,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid port override"),
            }
        }
        if let Some(origins) = var(&["FIELDLINK_CORS_ORIGINS"]) {
            self.server.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(path) = var(&["FIELDLINK_WS_PATH", "WS_PATH"]) {
            self.broker.transport_path = path;
        }
        if let Some(topic) = var(&["FIELDLINK_STATUS_TOPIC", "TOPIC"]) {
            self.broker.status_topic = topic;
        }
        if let Some(topic) = var(&["FIELDLINK_COMMAND_TOPIC", "TOPIC_COMMAND"]) {
            self.broker.command_topic = topic;
        }

        if let Some(level) = var(&["FIELDLINK_LOG_LEVEL"]) {
            self.logging.level = level;
        }
        if let Some(format) = var(&["FIELDLINK_LOG_FORMAT"]) {
            self.logging.format = format;
        }
    }

    /// Check values the server cannot start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let path = &self.broker.transport_path;
        if !path.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "transport_path must start with '/': {}",
                path
            )));
        }
        if RESERVED_PATHS.contains(&path.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "transport_path {} collides with a REST route",
                path
            )));
        }

        for (name, topic) in [
            ("status_topic", &self.broker.status_topic),
            ("command_topic", &self.broker.command_topic),
        ] {
            validate_topic_name(topic)
                .map_err(|e| ConfigError::Invalid(format!("{} {:?}: {}", name, topic, e)))?;
        }

        if self.broker.outbound_capacity == 0 {
            return Err(ConfigError::Invalid(
                "outbound_capacity must be greater than zero".to_string(),
            ));
        }
        if self.broker.keep_alive_secs == 0 {
            return Err(ConfigError::Invalid(
                "keep_alive_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            host: self.server.host.clone(),
            port: self.server.port,
            transport_path: self.broker.transport_path.clone(),
            status_topic: self.broker.status_topic.clone(),
            command_topic: self.broker.command_topic.clone(),
            cors_origins: self.server.cors_origins.clone(),
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            keep_alive: Duration::from_secs(self.broker.keep_alive_secs),
            write_timeout: Duration::from_millis(self.broker.write_timeout_ms),
            outbound_capacity: self.broker.outbound_capacity,
            max_packet_size: self.broker.max_packet_size,
            max_sessions: self.broker.max_connections,
        }
    }

    pub fn router_config(&self) -> RouterConfig {
        RouterConfig {
            max_retained: self.broker.max_retained,
        }
    }
}

fn default_config_paths() -> Vec<PathBuf> {
    [
        dirs::config_dir().map(|p| p.join("fieldlink").join("config.toml")),
        Some(PathBuf::from("/etc/fieldlink/config.toml")),
        Some(PathBuf::from("./config.toml")),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Fieldlink Configuration
#
# Environment variables override these settings:
# - FIELDLINK_HOST (or HOST)
# - FIELDLINK_PORT (or PORT)
# - FIELDLINK_CORS_ORIGINS (comma separated)
# - FIELDLINK_WS_PATH (or WS_PATH)
# - FIELDLINK_STATUS_TOPIC (or TOPIC)
# - FIELDLINK_COMMAND_TOPIC (or TOPIC_COMMAND)
# - FIELDLINK_LOG_LEVEL
# - FIELDLINK_LOG_FORMAT

[server]
# HTTP listener host
host = "0.0.0.0"

# HTTP listener port
port = 3000

# Allowed CORS origins; empty allows any origin
cors_origins = []

[broker]
# Path accepting MQTT-over-WebSocket upgrades
transport_path = "/mqtt"

# Topic POST /orders publishes to
status_topic = "devices/status"

# Topic POST /command publishes to
command_topic = "devices/command"

# Close sessions silent for this long (seconds)
keep_alive_secs = 90

# Upper bound on a single socket write (ms)
write_timeout_ms = 5000

# Per-session queue of pending deliveries
outbound_capacity = 256

# Upgrades beyond this many live sessions get 503
max_connections = 1000

# Largest accepted MQTT packet (bytes)
max_packet_size = 1048576

# Topics that may hold a retained message
max_retained = 10000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
