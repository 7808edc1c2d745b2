use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{
    location::{ip::DEFAULT_IP_GEOLOCATION_URL, reverse::DEFAULT_REVERSE_GEOCODE_URL},
    provider::openweather::DEFAULT_BASE_URL,
};

/// Environment variable that overrides the stored API key.
pub const API_KEY_ENV: &str = "SKYVIEW_API_KEY";

/// Optional endpoint overrides, mostly for testing against local servers.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Endpoints {
    pub weather_base_url: Option<String>,
    pub reverse_geocode_url: Option<String>,
    pub ip_geolocation_url: Option<String>,
}

/// Top-level configuration stored on disk.
#[derive(Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// OpenWeatherMap API key (just the key, not a URL).
    pub api_key: Option<String>,

    /// Example TOML:
    /// [endpoints]
    /// weather_base_url = "http://localhost:8080"
    #[serde(default)]
    pub endpoints: Endpoints,
}

// Redacts the API key.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    /// `SKYVIEW_API_KEY` wins over the stored key.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;

        if let Ok(key) = env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                tracing::debug!("Using API key from {API_KEY_ENV}");
                cfg.api_key = Some(key);
            }
        }

        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skyview", "skyview")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Returns the API key, if a non-blank one is configured.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key.trim().to_string());
    }

    pub fn weather_base_url(&self) -> &str {
        self.endpoints
            .weather_base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn reverse_geocode_url(&self) -> &str {
        self.endpoints
            .reverse_geocode_url
            .as_deref()
            .unwrap_or(DEFAULT_REVERSE_GEOCODE_URL)
    }

    pub fn ip_geolocation_url(&self) -> &str {
        self.endpoints
            .ip_geolocation_url
            .as_deref()
            .unwrap_or(DEFAULT_IP_GEOLOCATION_URL)
    }
}
