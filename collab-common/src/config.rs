//! Configuration loading and resolution
//!
//! Bootstrap settings come from four places, highest priority first:
//! 1. Command-line arguments
//! 2. Environment variables (the binary maps these through clap)
//! 3. TOML config file
//! 4. Compiled defaults
//!
//! A missing config file is not an error: a warning is logged and defaults apply.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 3000;

/// Default bind address
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Records per write batch during ingestion
pub const DEFAULT_CHUNK_SIZE: usize = 50;

/// Rows the reader may hold ahead of the batcher
pub const DEFAULT_READ_AHEAD: usize = 1;

/// Upload size limit (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// TOML bootstrap file contents. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Path to the SQLite database file
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestConfig {
    pub chunk_size: Option<usize>,
    pub read_ahead: Option<usize>,
    pub max_upload_bytes: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Values supplied on the command line (or via their env fallbacks)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub chunk_size: Option<usize>,
}

/// Fully resolved settings used by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub chunk_size: usize,
    pub read_ahead: usize,
    pub max_upload_bytes: usize,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            read_ahead: DEFAULT_READ_AHEAD,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Resolve settings from overrides, the TOML file and compiled defaults
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self> {
        let toml_config = load_toml_config(overrides.config_path.as_deref())?;
        Self::merge(overrides, toml_config)
    }

    /// Merge already-loaded TOML values under the overrides
    pub fn merge(overrides: &ConfigOverrides, toml_config: TomlConfig) -> Result<Self> {
        let defaults = Settings::default();

        let settings = Settings {
            database_path: overrides
                .database_path
                .clone()
                .or(toml_config.database_path)
                .unwrap_or(defaults.database_path),
            host: overrides
                .host
                .clone()
                .or(toml_config.server.host)
                .unwrap_or(defaults.host),
            port: overrides
                .port
                .or(toml_config.server.port)
                .unwrap_or(defaults.port),
            chunk_size: overrides
                .chunk_size
                .or(toml_config.ingest.chunk_size)
                .unwrap_or(defaults.chunk_size),
            read_ahead: toml_config.ingest.read_ahead.unwrap_or(defaults.read_ahead),
            max_upload_bytes: toml_config
                .ingest
                .max_upload_bytes
                .unwrap_or(defaults.max_upload_bytes),
            log_level: toml_config.logging.level,
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the ingestion pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be at least 1".to_string()));
        }
        if self.read_ahead == 0 {
            return Err(Error::Config("read_ahead must be at least 1".to_string()));
        }
        if self.max_upload_bytes == 0 {
            return Err(Error::Config(
                "max_upload_bytes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load the TOML config file.
///
/// An explicitly requested file must exist. The platform default location is
/// optional and yields an empty config when absent.
pub fn load_toml_config(explicit_path: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit_path {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            Some(path) => {
                warn!(
                    "No config file at {}, using defaults",
                    path.display()
                );
                return Ok(TomlConfig::default());
            }
            None => {
                warn!("Could not determine config directory, using defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded config file: {}", path.display());
    Ok(config)
}

/// `<config dir>/collab/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("collab").join("config.toml"))
}

/// `<local data dir>/collab/collab.db`, or `./collab_data/collab.db` when the
/// platform has no data directory
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("collab"))
        .unwrap_or_else(|| PathBuf::from("./collab_data"))
        .join("collab.db")
}
