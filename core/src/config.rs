//! Client configuration.
//!
//! The only setting is the service root every operation path is appended to.
//! It comes from a TOML file, from `ACCOUNT_API_BASE_URL`, or defaults to the
//! local mock server.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const BASE_URL_ENV: &str = "ACCOUNT_API_BASE_URL";
pub const DEFAULT_CONFIG_PATHS: &[&str] = &["account.toml", "config/account.toml"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Read the base URL from `ACCOUNT_API_BASE_URL`, or use the default.
    pub fn from_env() -> Self {
        match env::var(BASE_URL_ENV) {
            Ok(base_url) if !base_url.trim().is_empty() => Self { base_url },
            _ => Self::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Load the config from `path`, or from the first default path that exists.
///
/// Falls back to `ClientConfig::default()` when no candidate file exists.
pub fn load_config(path: Option<PathBuf>) -> Result<ClientConfig, ConfigError> {
    let candidate_paths = match path {
        Some(p) => vec![p],
        None => DEFAULT_CONFIG_PATHS.iter().map(PathBuf::from).collect(),
    };

    for candidate in candidate_paths {
        if let Some(config) = try_load_file(&candidate)? {
            return Ok(config);
        }
    }

    Ok(ClientConfig::default())
}

fn try_load_file(path: &Path) -> Result<Option<ClientConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config: ClientConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(Some(config))
}
