//! Configuration loading
//!
//! Each setting resolves in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::image_index::DEFAULT_EXTENSIONS;
use crate::label_log::DEFAULT_LABELS_FILE;
use crate::{Error, Result};

pub const ENV_DATASET_DIR: &str = "LABELER_DATASET_DIR";
pub const ENV_LABELS_FILE: &str = "LABELER_LABELS_FILE";
pub const ENV_HOST: &str = "LABELER_HOST";
pub const ENV_PORT: &str = "LABELER_PORT";

pub const DEFAULT_DATASET_DIR: &str = "embryo_dataset";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Contents of the optional TOML config file
///
/// Every field is optional; absent fields fall through to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub dataset_dir: Option<PathBuf>,
    pub labels_file: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub extensions: Option<Vec<String>>,
    pub log_level: Option<String>,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub dataset_dir: Option<PathBuf>,
    pub labels_file: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Explicit config file; the platform default location is used otherwise
    pub config_file: Option<PathBuf>,
}

/// Fully resolved labeler configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LabelerConfig {
    pub dataset_dir: PathBuf,
    pub labels_file: PathBuf,
    pub host: String,
    pub port: u16,
    pub extensions: Vec<String>,
    pub log_level: String,
}

impl Default for LabelerConfig {
    fn default() -> Self {
        Self {
            dataset_dir: PathBuf::from(DEFAULT_DATASET_DIR),
            labels_file: PathBuf::from(DEFAULT_LABELS_FILE),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl LabelerConfig {
    /// Resolve configuration from CLI, environment, config file, and defaults
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        let config_path = cli.config_file.clone().or_else(default_config_path);
        let toml = match config_path {
            Some(path) => load_toml_config(&path)?,
            None => TomlConfig::default(),
        };
        Self::merge(cli, &toml)
    }

    /// Merge already-loaded sources; environment variables are read here
    pub fn merge(cli: &CliOverrides, toml: &TomlConfig) -> Result<Self> {
        let defaults = Self::default();

        let dataset_dir = cli
            .dataset_dir
            .clone()
            .or_else(|| env_var(ENV_DATASET_DIR).map(PathBuf::from))
            .or_else(|| toml.dataset_dir.clone())
            .unwrap_or(defaults.dataset_dir);

        let labels_file = cli
            .labels_file
            .clone()
            .or_else(|| env_var(ENV_LABELS_FILE).map(PathBuf::from))
            .or_else(|| toml.labels_file.clone())
            .unwrap_or(defaults.labels_file);

        let host = cli
            .host
            .clone()
            .or_else(|| env_var(ENV_HOST))
            .or_else(|| toml.host.clone())
            .unwrap_or(defaults.host);

        let env_port = match env_var(ENV_PORT) {
            Some(value) => Some(value.parse::<u16>().map_err(|e| {
                Error::Config(format!("{}={:?} is not a valid port: {}", ENV_PORT, value, e))
            })?),
            None => None,
        };
        let port = cli.port.or(env_port).or(toml.port).unwrap_or(defaults.port);

        let extensions = match &toml.extensions {
            Some(exts) if exts.is_empty() => {
                return Err(Error::Config("extensions must not be empty".to_string()));
            }
            Some(exts) => exts.clone(),
            None => defaults.extensions,
        };

        let log_level = toml.log_level.clone().unwrap_or(defaults.log_level);

        Ok(Self {
            dataset_dir,
            labels_file,
            host,
            port,
            extensions,
            log_level,
        })
    }

    /// Address string for binding the HTTP listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Platform config location: `<config_dir>/labeler/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("labeler").join("config.toml"))
}

/// Load the TOML config file
///
/// A missing file is not an error: defaults are used. A file that exists but
/// cannot be read or parsed is.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        debug!("Config file {} not found, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded config file {}", path.display());
    Ok(config)
}

/// Non-empty environment variable value
fn env_var(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        Ok(_) => {
            warn!("{} is set but empty, ignoring", name);
            None
        }
        Err(_) => None,
    }
}
