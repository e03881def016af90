use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::ai::EnrichmentSettings;

pub const DEFAULT_SUMMARY_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_ANALYSIS_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_THINKING_BUDGET: u32 = 32768;

/// Credentials and model choice for the generative-text provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    pub api_key: String,
    #[serde(default = "default_summary_model")]
    pub summary_model: String,
    #[serde(default = "default_analysis_model")]
    pub analysis_model: String,
    #[serde(default = "default_thinking_budget")]
    pub thinking_budget: u32,
}

impl AiConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            summary_model: default_summary_model(),
            analysis_model: default_analysis_model(),
            thinking_budget: default_thinking_budget(),
        }
    }
}

fn default_summary_model() -> String {
    DEFAULT_SUMMARY_MODEL.to_string()
}

fn default_analysis_model() -> String {
    DEFAULT_ANALYSIS_MODEL.to_string()
}

fn default_thinking_budget() -> u32 {
    DEFAULT_THINKING_BUDGET
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// default_location = "London"
///
/// [ai]
/// api_key = "..."
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Queried when device geolocation is unavailable or refused.
    pub default_location: String,
    /// Language passed to geocoding.
    pub language: String,
    pub geolocation_timeout_secs: u64,
    pub analysis_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub ai: Option<AiConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_location: "London".to_string(),
            language: "en".to_string(),
            geolocation_timeout_secs: 5,
            analysis_timeout_secs: 120,
            request_timeout_secs: 15,
            ai: None,
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
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
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Path to the persisted favorites list.
    pub fn favorites_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.data_dir().join("favorites.json"))
    }

    /// Set or replace the AI API key, keeping any model overrides.
    pub fn upsert_ai_api_key(&mut self, api_key: String) {
        match self.ai.as_mut() {
            Some(ai) => ai.api_key = api_key,
            None => self.ai = Some(AiConfig::new(api_key)),
        }
    }

    pub fn ai_api_key(&self) -> Option<&str> {
        self.ai
            .as_ref()
            .map(|ai| ai.api_key.as_str())
            .filter(|key| !key.trim().is_empty())
    }

    pub fn is_ai_configured(&self) -> bool {
        self.ai_api_key().is_some()
    }

    /// Like [`Config::ai_api_key`], with a hint when missing.
    pub fn require_ai_api_key(&self) -> Result<&str> {
        self.ai_api_key().ok_or_else(|| {
            anyhow!(
                "No AI API key configured.\n\
                 Hint: run `skyview configure` and enter your API key."
            )
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn geolocation_timeout(&self) -> Duration {
        Duration::from_secs(self.geolocation_timeout_secs)
    }

    /// Enrichment settings, if AI is configured.
    pub fn enrichment_settings(&self) -> Option<EnrichmentSettings> {
        self.ai.as_ref().filter(|_| self.is_ai_configured()).map(|ai| EnrichmentSettings {
            quick_summary: true,
            summary_model: ai.summary_model.clone(),
            analysis_model: ai.analysis_model.clone(),
            thinking_budget: ai.thinking_budget,
            analysis_timeout: Duration::from_secs(self.analysis_timeout_secs),
        })
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "skyview", "skyview")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}
