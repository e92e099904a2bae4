//! Service configuration.
//!
//! Settings come from an optional TOML file, then environment overrides
//! (usually supplied through `.env`). The environment lookup is passed in
//! as a closure rather than read inside, so parsing stays deterministic in
//! tests.

use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;

use log::LevelFilter;
use serde::Deserialize;
use thiserror::Error;

/// Config file read when `CLIMATE_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "./climate_service.toml";

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("No database URL: set DATABASE_URL or [database].url")]
    MissingDatabaseUrl,
    #[error("Invalid bind address '{0}'")]
    InvalidBindAddress(String),
    #[error("Invalid log level '{0}'")]
    InvalidLogLevel(String),
}

// ---------------------------------------------------------------------------
// File layout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { bind_addr: DEFAULT_BIND_ADDR.to_string() }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub file: Option<String>,
    pub timestamps: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            timestamps: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Settings {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Reads `path`; a missing file yields the defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    /// Overrides file values with `DATABASE_URL`, `CLIMATE_BIND_ADDR` and
    /// `CLIMATE_LOG_LEVEL` where `lookup` returns them.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Some(addr) = lookup("CLIMATE_BIND_ADDR") {
            self.server.bind_addr = addr;
        }
        if let Some(level) = lookup("CLIMATE_LOG_LEVEL") {
            self.logging.level = level;
        }
        self
    }

    /// Loads from `CLIMATE_CONFIG` (or [`DEFAULT_CONFIG_PATH`]) and applies
    /// the process environment on top.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("CLIMATE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        Ok(Self::from_file(path)?.with_env_overrides(|key| std::env::var(key).ok()))
    }

    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database
            .url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingDatabaseUrl)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind_addr
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddress(self.server.bind_addr.clone()))
    }

    pub fn log_level(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(&self.logging.level)
            .map_err(|_| ConfigError::InvalidLogLevel(self.logging.level.clone()))
    }
}
