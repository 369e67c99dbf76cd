//! Startup configuration and secrets.
//!
//! # Responsibility
//! - Parse the TOML secrets file into an immutable `AppConfig`.
//! - Resolve the config path and token override from the environment.
//!
//! # Invariants
//! - Configuration is loaded once at startup and never reloaded.
//! - The management token never appears in `Debug` output.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "PROJINVITE_CONFIG";
pub const MANAGE_TOKEN_ENV: &str = "PROJINVITE_MANAGE_TOKEN";
pub const DEFAULT_CONFIG_FILE_NAME: &str = "projinvite.toml";
pub const DEFAULT_API_BASE_URL: &str = "https://connection.keboola.com/manage/projects";

/// Configuration loading errors.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    MissingToken,
    InvalidStorage(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::MissingToken => write!(f, "manage_token must not be empty"),
            Self::InvalidStorage(message) => write!(f, "invalid storage config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::MissingToken | Self::InvalidStorage(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Pre-shared management API token.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ManageToken(String);

impl ManageToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl Debug for ManageToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("ManageToken(<redacted>)")
    }
}

/// Which storage backend holds the project and assignment relations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StorageConfig {
    /// One SQLite database file.
    Sqlite { path: PathBuf },
    /// `projects.json` and `assignments.json` inside `dir`.
    Files { dir: PathBuf },
}

/// Immutable process configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    pub manage_token: ManageToken,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    pub storage: StorageConfig,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl AppConfig {
    /// Parses and validates config text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the config file and applies the token environment override.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&text)?;
        if let Some(token) = env_non_empty(MANAGE_TOKEN_ENV) {
            config.manage_token = ManageToken::new(token);
        }
        config.validate()?;
        Ok(config)
    }

    /// Loads config from `PROJINVITE_CONFIG` or `./projinvite.toml`.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(resolve_config_path())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.manage_token.expose().trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        match &self.storage {
            StorageConfig::Sqlite { path } if path.as_os_str().is_empty() => Err(
                ConfigError::InvalidStorage("sqlite path cannot be empty".to_string()),
            ),
            StorageConfig::Files { dir } if dir.as_os_str().is_empty() => Err(
                ConfigError::InvalidStorage("files dir cannot be empty".to_string()),
            ),
            _ => Ok(()),
        }
    }
}

/// Returns the config path from the environment, or the working-directory default.
pub fn resolve_config_path() -> PathBuf {
    env_non_empty(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE_NAME))
}

fn env_non_empty(key: &str) -> Option<String> {
    let raw = std::env::var(key).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
