//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::websocket::ConnectOptions;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub hub: HubConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Hub connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Long-lived access token
    #[serde(default)]
    pub token: String,

    /// Connect with `wss://`
    #[serde(default)]
    pub secure: bool,

    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_secs: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8123
}

fn default_handshake_timeout() -> u64 {
    3
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            token: String::new(),
            secure: false,
            handshake_timeout_secs: default_handshake_timeout(),
        }
    }
}

impl HubConfig {
    /// Connection parameters for the handshake
    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions::new(self.host.clone(), self.port, self.token.clone())
            .secure(self.secure)
            .timeout(Duration::from_secs(self.handshake_timeout_secs))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

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
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("homewire").join("config.toml")),
            Some(PathBuf::from("/etc/homewire/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("HOMEWIRE_HOST") {
            self.hub.host = host;
        }
        if let Ok(port) = std::env::var("HOMEWIRE_PORT") {
            if let Ok(p) = port.parse() {
                self.hub.port = p;
            }
        }
        if let Ok(token) = std::env::var("HOMEWIRE_TOKEN") {
            self.hub.token = token;
        }
        if let Ok(secs) = std::env::var("HOMEWIRE_HANDSHAKE_TIMEOUT_SECS") {
            if let Ok(s) = secs.parse() {
                self.hub.handshake_timeout_secs = s;
            }
        }

        if let Ok(level) = std::env::var("HOMEWIRE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("HOMEWIRE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Homewire Configuration
#
# Environment variables override these settings:
# - HOMEWIRE_HOST
# - HOMEWIRE_PORT
# - HOMEWIRE_TOKEN
# - HOMEWIRE_HANDSHAKE_TIMEOUT_SECS
# - HOMEWIRE_LOG_LEVEL
# - HOMEWIRE_LOG_FORMAT

[hub]
# Hub address
host = "localhost"
port = 8123

# Long-lived access token (prefer HOMEWIRE_TOKEN)
token = ""

# Connect over TLS (wss://)
secure = false

# Time budget for connect + authentication (seconds)
handshake_timeout_secs = 3

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
