//! Configuration loading and data directory resolution.
//!
//! Values are resolved in priority order:
//! 1. Command-line argument (data directory only)
//! 2. Environment variable (`STACKER_DATA_DIR`, `STACKER_API_URL`, `STACKER_API_KEY`)
//! 3. `stacker.toml` in the data directory
//! 4. Values baked in at build time (`STACKER_API_URL`, `STACKER_API_KEY`)

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, StackError};

pub const ENV_DATA_DIR: &str = "STACKER_DATA_DIR";
pub const ENV_API_URL: &str = "STACKER_API_URL";
pub const ENV_API_KEY: &str = "STACKER_API_KEY";

/// Name of the optional config file inside the data directory.
pub const CONFIG_FILE_NAME: &str = "stacker.toml";

const DEFAULT_DATA_DIR: &str = ".stacker";

const BUILD_API_URL: Option<&str> = option_env!("STACKER_API_URL");
const BUILD_API_KEY: Option<&str> = option_env!("STACKER_API_KEY");

/// Resolved configuration for one stacker session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackConfig {
    pub data_dir: PathBuf,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Contents of `stacker.toml`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    api_url: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

impl FileConfig {
    fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| StackError::Config(format!("{}: {e}", path.display())))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl StackConfig {
    /// Resolve configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Config`] if `stacker.toml` exists but is malformed.
    pub fn resolve(cli_data_dir: Option<&Path>) -> Result<Self> {
        Self::resolve_with(cli_data_dir, |name| std::env::var(name).ok())
    }

    /// Resolve configuration with an explicit environment lookup.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Config`] if `stacker.toml` exists but is malformed.
    pub fn resolve_with<F>(cli_data_dir: Option<&Path>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = cli_data_dir
            .map(Path::to_path_buf)
            .or_else(|| non_empty(env(ENV_DATA_DIR)).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let file = FileConfig::load(&data_dir.join(CONFIG_FILE_NAME))?;

        let api_url = non_empty(env(ENV_API_URL))
            .or(non_empty(file.api_url))
            .or_else(|| non_empty(BUILD_API_URL.map(str::to_string)));
        let api_key = non_empty(env(ENV_API_KEY))
            .or(non_empty(file.api_key))
            .or_else(|| non_empty(BUILD_API_KEY.map(str::to_string)));

        Ok(Self {
            data_dir,
            api_url,
            api_key,
            timeout_secs: file.timeout_secs,
        })
    }

    /// Directory holding ordinary recipe documents; stacked recipes live
    /// in its `stacked/` sub-directory.
    pub fn documents_dir(&self) -> PathBuf {
        self.data_dir.join("recipes")
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("recipes.db")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.data_dir.join("secrets.toml")
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            endpoint: self.api_url.clone(),
            api_key: self.api_key.clone(),
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Settings for the remote merge call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncConfig {
    pub endpoint: Option<String>,
    /// Configured secret, used to provision the secret store when it is empty.
    pub api_key: Option<String>,
    /// Client-side request timeout. Unset means the transport's own bound.
    pub timeout: Option<Duration>,
}

impl SyncConfig {
    /// # Errors
    ///
    /// Returns [`StackError::Config`] if no endpoint is configured.
    pub fn require_endpoint(&self) -> Result<&str> {
        self.endpoint
            .as_deref()
            .ok_or_else(|| StackError::Config("merge endpoint URL not configured".to_string()))
    }

    /// # Errors
    ///
    /// Returns [`StackError::Config`] if no API key is configured.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| StackError::Config("API key not configured".to_string()))
    }
}
