use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::provider::ProviderId;

/// Cities fetched on every run, in order.
pub const CITIES: &[&str] = &["Colombo", "London", "New York", "Tokyo", "Sydney"];
pub const DB_PATH: &str = "weather_data.db";
pub const TABLE_NAME: &str = "weather";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Pause after every fetch, successful or not.
pub const SLEEP_BETWEEN: Duration = Duration::from_secs(1);

/// Optional dotenv file in the working directory. Never overrides the real environment.
pub const DOTENV_FILE: &str = ".env";
/// Environment variable holding the OpenWeather API key.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";
/// Value shipped in sample env files. Treated the same as no key at all.
pub const PLACEHOLDER_API_KEY: &str = "your_api_key_here";

/// Credentials for a single provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// Settings stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Example TOML:
    /// [providers.openweather]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl Settings {
    /// Load settings from the platform config directory, or defaults if the file doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    /// Like [`Settings::load_from`], but a broken file only costs its key: warn and use defaults.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load_from(path).unwrap_or_else(|err| {
            tracing::warn!("Ignoring settings file: {err:#}");
            Self::default()
        })
    }

    /// Save settings to the platform config directory.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save settings to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(self).context("Failed to serialize settings to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write settings file: {}", path.display()))
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-pipeline", "weather-pipeline")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn upsert_api_key(&mut self, id: ProviderId, api_key: String) {
        self.providers.insert(id.as_str().to_string(), ProviderConfig { api_key });
    }

    pub fn remove_api_key(&mut self, id: ProviderId) -> bool {
        self.providers.remove(id.as_str()).is_some()
    }

    pub fn api_key(&self, id: ProviderId) -> Option<&str> {
        self.providers.get(id.as_str()).map(|cfg| cfg.api_key.as_str())
    }
}

/// Everything one run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Usable OpenWeather key. `None` selects mock data.
    pub api_key: Option<String>,
    pub cities: Vec<String>,
    pub db_path: PathBuf,
    pub table: String,
    pub request_timeout: Duration,
    pub sleep_between: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            cities: CITIES.iter().map(|c| c.to_string()).collect(),
            db_path: PathBuf::from(DB_PATH),
            table: TABLE_NAME.to_string(),
            request_timeout: REQUEST_TIMEOUT,
            sleep_between: SLEEP_BETWEEN,
        }
    }
}

impl RunConfig {
    /// Resolve from the process environment, `./.env` and the settings file.
    pub fn from_env() -> Self {
        let settings = match Settings::config_file_path() {
            Ok(path) => Settings::load_or_default(&path),
            Err(err) => {
                tracing::warn!("Ignoring settings file: {err:#}");
                Settings::default()
            }
        };

        Self::from_sources(std::env::var(API_KEY_ENV).ok(), Path::new(DOTENV_FILE), &settings)
    }

    /// Key lookup order: process environment, then the dotenv file, then the settings file.
    pub fn from_sources(env_key: Option<String>, dotenv: &Path, settings: &Settings) -> Self {
        Self::resolve(env_key.or_else(|| dotenv_api_key(dotenv)), settings)
    }

    /// The environment value wins over the settings file. Empty and placeholder keys are dropped.
    pub fn resolve(env_key: Option<String>, settings: &Settings) -> Self {
        let api_key = env_key
            .or_else(|| settings.api_key(ProviderId::OpenWeather).map(str::to_owned))
            .map(|key| key.trim().to_string())
            .filter(|key| is_usable_api_key(key));

        Self { api_key, ..Self::default() }
    }
}

/// `OPENWEATHER_API_KEY` from a dotenv file. A missing or unreadable file yields `None`.
pub fn dotenv_api_key(path: &Path) -> Option<String> {
    let entries = match dotenvy::from_path_iter(path) {
        Ok(entries) => entries,
        Err(err) if err.not_found() => return None,
        Err(err) => {
            tracing::warn!("Ignoring {}: {err}", path.display());
            return None;
        }
    };

    entries
        .filter_map(|entry| match entry {
            Ok(pair) => Some(pair),
            Err(err) => {
                tracing::warn!("Skipping malformed line in {}: {err}", path.display());
                None
            }
        })
        .find_map(|(key, value)| (key == API_KEY_ENV).then_some(value))
}

fn is_usable_api_key(key: &str) -> bool {
    !key.is_empty() && key != PLACEHOLDER_API_KEY
}
