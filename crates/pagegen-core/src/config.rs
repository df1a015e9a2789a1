use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result, anyhow};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "openai/gpt-3.5-turbo";
pub const DEFAULT_REFERER: &str = "http://localhost";
pub const DEFAULT_TITLE: &str = "AI Landing Page Generator";

pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";
pub const MODEL_ENV: &str = "PAGEGEN_MODEL";
pub const BASE_URL_ENV: &str = "PAGEGEN_BASE_URL";
pub const REFERER_ENV: &str = "PAGEGEN_REFERER";

/// Persisted user configuration (`<config_dir>/pagegen/config.json`).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub referer: Option<String>,
    pub title: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::get_config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("pagegen").join("config.json"))
    }
}

/// Load `.env` from the working directory, if there is one.
pub fn load_env_file() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Effective settings for the completion client after layering
/// defaults, the config file and the environment.
#[derive(Clone, PartialEq)]
pub struct Settings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub referer: String,
    pub title: String,
    pub timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            title: DEFAULT_TITLE.to_string(),
            timeout: None,
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("referer", &self.referer)
            .field("title", &self.title)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Settings {
    pub fn resolve(config: &Config) -> Self {
        Self::resolve_with(config, |key| std::env::var(key).ok())
    }

    /// Environment wins over the config file, which wins over defaults.
    /// Blank values are treated as unset.
    pub fn resolve_with<F>(config: &Config, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let from_env = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        let file = |value: &Option<String>| value.clone().filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            api_key: from_env(API_KEY_ENV).or_else(|| file(&config.api_key)),
            base_url: from_env(BASE_URL_ENV)
                .or_else(|| file(&config.base_url))
                .unwrap_or(defaults.base_url),
            model: from_env(MODEL_ENV)
                .or_else(|| file(&config.model))
                .unwrap_or(defaults.model),
            referer: from_env(REFERER_ENV)
                .or_else(|| file(&config.referer))
                .unwrap_or(defaults.referer),
            title: file(&config.title).unwrap_or(defaults.title),
            timeout: config.timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Where the key came from, for the header line.
    pub fn key_source(&self, config: &Config) -> Option<&'static str> {
        self.api_key.as_ref()?;
        if config.api_key.as_deref() == self.api_key.as_deref() {
            Some("config")
        } else {
            Some("env")
        }
    }
}
