use crate::core::scheduler::{DEFAULT_REFRESH_PERIOD, MIN_REFRESH_PERIOD};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "default_origin")]
    pub origin: String,
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

fn default_origin() -> String {
    "http://localhost:5000".to_string()
}

fn default_base_path() -> String {
    "/api".to_string()
}

fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_PERIOD.as_secs()
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            origin: default_origin(),
            base_path: default_base_path(),
        }
    }
}

impl ApiConfig {
    /// Origin joined with the base path, without doubled slashes.
    pub fn base_url(&self) -> String {
        let origin = self.origin.trim_end_matches('/');
        let path = self.base_path.trim_matches('/');
        if path.is_empty() {
            origin.to_string()
        } else {
            format!("{origin}/{path}")
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    pub data_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api: ApiConfig::default(),
            refresh_interval_secs: default_refresh_interval(),
            data_path: None,
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, or defaults if there is
    /// no config file yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "coindash", "coindash")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("dev", "coindash", "coindash")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs).max(MIN_REFRESH_PERIOD)
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
