//! Configuration loading and representation.
//!
//! Layering (later wins): built-in defaults, `praja.toml`, then `PRAJA_`
//! environment variables with `__` separating nested keys
//! (`PRAJA_SERVER__PORT=9000`).

use std::path::Path;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use praja_observability::LogConfig;

pub const DEFAULT_CONFIG_FILE: &str = "praja.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(#[from] figment::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// How often the notification worker checks for shutdown while idle.
    pub poll_interval_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 250,
        }
    }
}

impl NotificationConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Catalog database. When `url` is unset the server starts with an empty,
/// purely in-memory ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrajaConfig {
    pub server: ServerConfig,
    pub log: LogConfig,
    pub notifications: NotificationConfig,
    pub database: DatabaseConfig,
}

impl PrajaConfig {
    /// Load from [`DEFAULT_CONFIG_FILE`] in the working directory plus the
    /// environment. A missing file is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment(DEFAULT_CONFIG_FILE))
    }

    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(PrajaConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("PRAJA_").split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        Ok(figment.extract()?)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
