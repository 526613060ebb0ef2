use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::{
    geocode::DEFAULT_GEOCODE_URL, geolocation::DEFAULT_GEOIP_URL,
    provider::openweather::DEFAULT_WEATHER_URL,
};

/// Environment variable that overrides the API key from the config file.
pub const API_KEY_ENV: &str = "NIMBUS_API_KEY";

/// Remote endpoints. Overridable for proxies and tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub weather: String,
    pub geocode: String,
    pub geoip: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            weather: DEFAULT_WEATHER_URL.to_string(),
            geocode: DEFAULT_GEOCODE_URL.to_string(),
            geoip: DEFAULT_GEOIP_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
    /// Whether the device position may be looked up at all.
    pub enabled: bool,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
///
/// [geolocation]
/// enabled = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// OpenWeather API key.
    pub api_key: Option<String>,
    pub geolocation: GeolocationConfig,
    pub endpoints: Endpoints,
}

impl Config {
    /// API key to use. [`Config::load`] has already applied `NIMBUS_API_KEY`.
    pub fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty()).ok_or_else(|| {
            anyhow!(
                "No API key configured.\n\
                 Hint: run `nimbus configure` or set {API_KEY_ENV}."
            )
        })
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.apply_env_override(std::env::var(API_KEY_ENV).ok());
        Ok(cfg)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
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

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
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

    fn apply_env_override(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key.trim().to_string());
        }
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Path to the key-value storage file.
    pub fn storage_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.data_dir().join("storage.json"))
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "nimbus", "nimbus")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}
