use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};

use crate::{
    error::DashboardError,
    model::{HistoryWindow, Location},
    prediction::PredictionKind,
    validation::FieldBound,
};

pub const DEFAULT_WEATHER_API_URL: &str = "http://api.weatherapi.com/v1";
pub const DEFAULT_LOCATION: &str = "Melbourne";

/// Credentials and endpoint of the external weather provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherApiConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_weather_api_url")]
    pub base_url: String,
}

impl Default for WeatherApiConfig {
    fn default() -> Self {
        Self { api_key: None, base_url: default_weather_api_url() }
    }
}

/// Prediction/visualization backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: Option<String>,
    /// No timeout when absent.
    pub timeout_secs: Option<u64>,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// location = "Melbourne"
///
/// [weather_api]
/// api_key = "..."
///
/// [backend]
/// base_url = "http://localhost:8000"
///
/// [bounds.rain.wind_gust_dir]
/// min = 0.0
/// max = 16.0
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_location")]
    pub location: String,

    #[serde(default = "default_forecast_days")]
    pub forecast_days: u8,

    #[serde(default)]
    pub weather_api: WeatherApiConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub history: HistoryWindow,

    /// Per-form, per-field overrides of the declared input bounds, keyed by
    /// [`PredictionKind::as_str`].
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub bounds: HashMap<String, HashMap<String, FieldBound>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            location: default_location(),
            forecast_days: default_forecast_days(),
            weather_api: WeatherApiConfig::default(),
            backend: BackendConfig::default(),
            history: HistoryWindow::default(),
            bounds: HashMap::new(),
        }
    }
}

fn default_weather_api_url() -> String {
    DEFAULT_WEATHER_API_URL.to_string()
}

fn default_location() -> String {
    DEFAULT_LOCATION.to_string()
}

const fn default_forecast_days() -> u8 {
    7
}

impl Config {
    /// Load config from disk (or defaults on first run), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = Self::load_file()?;
        cfg.apply_env(std::env::vars());
        Ok(cfg)
    }

    /// Load the file only, without environment overrides.
    pub fn load_file() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(contents)?;
        cfg.check_history()?;
        Ok(cfg)
    }

    fn check_history(&self) -> Result<()> {
        let HistoryWindow { min_date, max_date } = self.history;
        if min_date > max_date {
            let path = Self::config_file_path()
                .map_or_else(|_| "config.toml".to_string(), |p| p.display().to_string());
            return Err(DashboardError::Configuration(format!(
                "[history] min_date {min_date} is after max_date {max_date}.\n\
                 Hint: fix the [history] section of {path}."
            ))
            .into());
        }
        Ok(())
    }

    /// Overrides from `WEATHER_API_KEY`, `WEATHER_BACKEND_URL` and `WEATHER_LOCATION`.
    pub fn apply_env<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if value.trim().is_empty() {
                continue;
            }
            match key.as_str() {
                "WEATHER_API_KEY" => self.weather_api.api_key = Some(value),
                "WEATHER_BACKEND_URL" => self.backend.base_url = Some(value),
                "WEATHER_LOCATION" => self.location = value,
                _ => {}
            }
        }
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherdash", "weatherdash")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn weather_api_key(&self) -> Result<&str> {
        self.weather_api.api_key.as_deref().ok_or_else(|| {
            anyhow!(
                "No weather API key configured.\n\
                 Hint: run `weatherdash configure` or set WEATHER_API_KEY."
            )
        })
    }

    pub fn backend_url(&self) -> Result<&str> {
        self.backend.base_url.as_deref().ok_or_else(|| {
            anyhow!(
                "No prediction backend configured.\n\
                 Hint: run `weatherdash configure` or set WEATHER_BACKEND_URL."
            )
        })
    }

    pub fn default_location(&self) -> Result<Location> {
        Ok(Location::new(self.location.clone())?)
    }

    /// Bound overrides for one prediction form, keyed by field name.
    pub fn bound_overrides(&self, kind: PredictionKind) -> Option<&HashMap<String, FieldBound>> {
        self.bounds.get(kind.as_str())
    }
}
