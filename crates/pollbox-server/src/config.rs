//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Seed data settings.
    #[serde(default)]
    pub seed: SeedConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled connections.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,

    /// How long a request may wait for a pooled connection, in milliseconds.
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
}

/// Seed data configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    /// Directory containing `polls.seed` and `poll_options_seeds/`.
    #[serde(default = "default_seed_dir")]
    pub dir: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "pollbox_db=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "pollbox.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    pollbox_db::DbRuntimeSettings::default().busy_timeout_ms
}

fn default_pool_max_size() -> u32 {
    pollbox_db::DbRuntimeSettings::default().pool_max_size
}

fn default_connection_timeout_ms() -> u64 {
    pollbox_db::DbRuntimeSettings::default().connection_timeout_ms
}

fn default_seed_dir() -> String {
    "seeds".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
            connection_timeout_ms: default_connection_timeout_ms(),
        }
    }
}

impl DatabaseConfig {
    /// Pool tunables derived from this section.
    pub fn runtime_settings(&self) -> pollbox_db::DbRuntimeSettings {
        pollbox_db::DbRuntimeSettings {
            busy_timeout_ms: self.busy_timeout_ms,
            pool_max_size: self.pool_max_size,
            connection_timeout_ms: self.connection_timeout_ms,
        }
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            dir: default_seed_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `POLLBOX_HOST` overrides `server.host`
/// - `POLLBOX_PORT` overrides `server.port`
/// - `POLLBOX_DB_PATH` overrides `database.path`
/// - `POLLBOX_DB_BUSY_TIMEOUT_MS` overrides `database.busy_timeout_ms`
/// - `POLLBOX_DB_POOL_MAX_SIZE` overrides `database.pool_max_size`
/// - `POLLBOX_DB_CONNECTION_TIMEOUT_MS` overrides `database.connection_timeout_ms`
/// - `POLLBOX_SEED_DIR` overrides `seed.dir`
/// - `POLLBOX_LOG_LEVEL` overrides `logging.level`
/// - `POLLBOX_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Applies overrides looked up through `var`. Unparseable values are ignored.
fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(parsed) = var("POLLBOX_HOST").and_then(|v| v.parse().ok()) {
        config.server.host = parsed;
    }
    if let Some(parsed) = var("POLLBOX_PORT").and_then(|v| v.parse().ok()) {
        config.server.port = parsed;
    }
    if let Some(db_path) = var("POLLBOX_DB_PATH") {
        config.database.path = db_path;
    }
    if let Some(parsed) = var("POLLBOX_DB_BUSY_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
        config.database.busy_timeout_ms = parsed;
    }
    if let Some(parsed) = var("POLLBOX_DB_POOL_MAX_SIZE").and_then(|v| v.parse().ok()) {
        config.database.pool_max_size = parsed;
    }
    if let Some(parsed) = var("POLLBOX_DB_CONNECTION_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
        config.database.connection_timeout_ms = parsed;
    }
    if let Some(dir) = var("POLLBOX_SEED_DIR") {
        config.seed.dir = dir;
    }
    if let Some(level) = var("POLLBOX_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("POLLBOX_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
}
