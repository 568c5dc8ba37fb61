use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cache::CACHE_MAX_SIZE;
use crate::codec::JPEG_QUALITY;
use crate::error::{Error, Result};

const CONFIG_FILE_NAME: &str = "config.toml";
const ENV_DATA_DIR: &str = "STYLOVA_DATA_DIR";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub remote: RemoteConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub models_dir: PathBuf,
    pub outputs_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the remote filter API; the server is a black box.
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    pub cache_capacity: usize,
    pub jpeg_quality: u8,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            remote: RemoteConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("models"),
            outputs_dir: PathBuf::from("outputs"),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ea486b7b-4527-4253-ba2d-9202a25f7e30-00-1yom1f4v4latn.sisko.replit.dev"
                .to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: CACHE_MAX_SIZE,
            jpeg_quality: JPEG_QUALITY,
        }
    }
}

impl AppConfig {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        toml::from_str(&raw).map_err(|e| Error::Config {
            reason: format!("failed to parse {}: {e}", path.display()),
        })
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let encoded = toml::to_string_pretty(self).map_err(|e| Error::Config {
            reason: format!("failed to serialize config TOML: {e}"),
        })?;
        fs::write(path, encoded)?;
        Ok(())
    }
}

/// Resolve the data directory with 3-tier priority:
/// 1. CLI override if provided
/// 2. STYLOVA_DATA_DIR environment variable
/// 3. Default: ./data
pub fn data_dir(cli_override: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_override {
        return path.to_path_buf();
    }

    if let Some(env_dir) = env::var_os(ENV_DATA_DIR) {
        return PathBuf::from(env_dir);
    }

    PathBuf::from("data")
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE_NAME)
}

/// First-run initialization: create the data directory and write a default
/// config.toml, leaving any existing file untouched.
pub fn initialize_data_dir(data_dir: &Path) -> Result<()> {
    if !data_dir.exists() {
        fs::create_dir_all(data_dir)?;
    }

    let cfg_path = config_path(data_dir);
    if !cfg_path.exists() {
        AppConfig::default().save_to_path(&cfg_path)?;
    }

    Ok(())
}

/// Returns the path as-is if absolute, otherwise joined to `base`.
pub fn resolve_relative_to(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
