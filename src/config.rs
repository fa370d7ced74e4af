use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::{ModelChoice, QualityLevel};
use crate::provider::ProviderKind;

/// Environment variable holding the provider credential
pub const API_KEY_ENV: &str = "IMAGINE_API_KEY";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(skip)]
    pub config_path: PathBuf,

    /// Key as stored in the file, kept apart from an injected one
    #[serde(skip)]
    stored_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default)]
    pub key: Option<String>,
    /// Provider-side model id (Hugging Face only)
    #[serde(default = "default_hf_model")]
    pub hf_model: String,
    /// Overrides the provider's default endpoint
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub model: ModelChoice,
    #[serde(default)]
    pub quality: QualityLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: String,
    #[serde(default = "default_true")]
    pub auto_download: bool,
    #[serde(default = "default_display")]
    pub display: DisplayMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Terminal,
    None,
}

impl DisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::Terminal => "terminal",
            DisplayMode::None => "none",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "none" => DisplayMode::None,
            _ => DisplayMode::Terminal,
        }
    }
}

// Default value functions
fn default_hf_model() -> String {
    "stabilityai/stable-diffusion-xl-base-1.0".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_output_directory() -> String {
    "./imagine-output".to_string()
}

fn default_true() -> bool {
    true
}

fn default_display() -> DisplayMode {
    DisplayMode::Terminal
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            key: None,
            hf_model: default_hf_model(),
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            model: ModelChoice::default(),
            quality: QualityLevel::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            auto_download: true,
            display: DisplayMode::Terminal,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            defaults: DefaultsConfig::default(),
            output: OutputConfig::default(),
            config_path: PathBuf::new(),
            stored_key: None,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "imagine", "imagine-cli")
            .context("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from the platform location or create default
    pub fn load_or_create() -> Result<Self> {
        let env_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        Self::load_from(&Self::config_path()?, env_key)
    }

    /// Load config from `path`, creating it when missing.
    ///
    /// A key passed in `env_key` takes precedence over the file and is never
    /// written back to disk.
    pub fn load_from(path: &Path, env_key: Option<String>) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str::<Config>(&content).context("Failed to parse config file")?
        } else {
            let config = Config {
                config_path: path.to_path_buf(),
                ..Default::default()
            };
            config.save()?;
            config
        };
        config.config_path = path.to_path_buf();
        config.stored_key = config.api.key.clone();

        if let Some(key) = env_key {
            config.api.key = Some(key);
        }

        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        // Only the stored key reaches the file, never an injected one
        let mut on_disk = self.clone();
        on_disk.api.key = self.stored_key.clone();

        let content = toml::to_string_pretty(&on_disk).context("Failed to serialize config")?;
        fs::write(&self.config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get API key (from config or environment)
    pub fn api_key(&self) -> Option<&str> {
        self.api.key.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// Whether the active key came from the environment rather than the file
    pub fn key_is_injected(&self) -> bool {
        self.api_key().is_some() && self.api.key != self.stored_key
    }

    /// Restore defaults, keeping the file location and an injected key
    pub fn reset(&mut self) {
        let injected = if self.key_is_injected() {
            self.api.key.take()
        } else {
            None
        };
        *self = Config {
            config_path: std::mem::take(&mut self.config_path),
            ..Default::default()
        };
        self.api.key = injected;
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Endpoint for the configured provider
    pub fn base_url(&self) -> String {
        self.api
            .base_url
            .clone()
            .unwrap_or_else(|| self.api.provider.default_base_url().to_string())
    }

    /// Set a config value by key path (e.g., "api.key", "defaults.quality")
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api.provider" => {
                self.api.provider = value.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            }
            "api.key" => {
                self.api.key = Some(value.to_string());
                self.stored_key = self.api.key.clone();
            }
            "api.hf_model" => self.api.hf_model = value.to_string(),
            "api.base_url" => {
                self.api.base_url = match value.trim() {
                    "" | "default" => None,
                    url => Some(url.trim_end_matches('/').to_string()),
                };
            }
            "api.timeout_secs" => {
                let secs: u64 = value.parse().context("Invalid number of seconds")?;
                if secs == 0 {
                    anyhow::bail!("Timeout must be at least 1 second");
                }
                self.api.timeout_secs = secs;
            }
            "defaults.model" => {
                let model: ModelChoice = value.parse().map_err(|e: String| anyhow::anyhow!(e))?;
                if !model.is_available() {
                    anyhow::bail!("The {} model is not available yet", model.label());
                }
                self.defaults.model = model;
            }
            "defaults.quality" => {
                let quality: u8 = value.parse().context("Quality must be a number from 0 to 100")?;
                if quality > QualityLevel::MAX {
                    anyhow::bail!("Quality must be a number from 0 to 100");
                }
                self.defaults.quality = QualityLevel::new(quality);
            }
            "output.directory" => self.output.directory = value.to_string(),
            "output.auto_download" => {
                self.output.auto_download = value.parse().context("Invalid boolean value")?;
            }
            "output.display" => {
                self.output.display = DisplayMode::from_str(value);
            }
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        Ok(())
    }

    /// Get a config value by key path
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "api.provider" => Some(self.api.provider.as_str().to_string()),
            "api.key" => self.api_key().map(|_| "****".to_string()), // Mask API key
            "api.hf_model" => Some(self.api.hf_model.clone()),
            "api.base_url" => Some(self.base_url()),
            "api.timeout_secs" => Some(self.api.timeout_secs.to_string()),
            "defaults.model" => Some(self.defaults.model.as_str().to_string()),
            "defaults.quality" => Some(self.defaults.quality.value().to_string()),
            "output.directory" => Some(self.output.directory.clone()),
            "output.auto_download" => Some(self.output.auto_download.to_string()),
            "output.display" => Some(self.output.display.as_str().to_string()),
            _ => None,
        }
    }

    /// Get all config keys
    pub fn keys() -> &'static [&'static str] {
        &[
            "api.provider",
            "api.key",
            "api.hf_model",
            "api.base_url",
            "api.timeout_secs",
            "defaults.model",
            "defaults.quality",
            "output.directory",
            "output.auto_download",
            "output.display",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path, None).unwrap();

        assert!(path.exists());
        assert_eq!(config.api.provider, ProviderKind::DeepAi);
        assert_eq!(config.api.timeout_secs, 120);
        assert_eq!(config.defaults.quality.value(), 50);
        assert!(config.api_key().is_none());
    }

    #[test]
    fn injected_key_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[api]\nkey = \"from-file\"\nprovider = \"huggingface\"\n").unwrap();

        let config = Config::load_from(&path, Some("from-env".into())).unwrap();

        assert_eq!(config.api_key(), Some("from-env"));
        assert_eq!(config.api.provider, ProviderKind::HuggingFace);
        assert_eq!(config.base_url(), ProviderKind::HuggingFace.default_base_url());
    }

    #[test]
    fn saving_with_injected_key_keeps_stored_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[api]\nkey = \"from-file\"\n").unwrap();

        let mut config = Config::load_from(&path, Some("from-env".into())).unwrap();
        config.set("defaults.quality", "70").unwrap();
        config.save().unwrap();

        let on_disk = fs::read_to_string(&path).unwrap();
        assert!(!on_disk.contains("from-env"));
        let reloaded = Config::load_from(&path, None).unwrap();
        assert_eq!(reloaded.api_key(), Some("from-file"));
        assert_eq!(reloaded.defaults.quality.value(), 70);
    }

    #[test]
    fn explicit_key_is_saved_while_injected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::load_from(&path, Some("from-env".into())).unwrap();
        config.set("api.key", "typed-in").unwrap();
        config.save().unwrap();

        let reloaded = Config::load_from(&path, None).unwrap();
        assert_eq!(reloaded.api_key(), Some("typed-in"));
    }

    #[test]
    fn reset_drops_stored_key_but_keeps_injected_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[api]\nkey = \"from-file\"\n[defaults]\nquality = 90\n").unwrap();

        let mut config = Config::load_from(&path, Some("from-env".into())).unwrap();
        assert!(config.key_is_injected());
        config.reset();
        config.save().unwrap();

        assert_eq!(config.config_path, path);
        assert_eq!(config.api_key(), Some("from-env"));
        assert_eq!(config.defaults.quality.value(), 50);
        let reloaded = Config::load_from(&path, None).unwrap();
        assert_eq!(reloaded.api_key(), None);
    }

    #[test]
    fn set_validates_values() {
        let mut config = Config::default();

        config.set("defaults.quality", "80").unwrap();
        assert_eq!(config.get("defaults.quality").as_deref(), Some("80"));
        assert!(config.set("defaults.quality", "101").is_err());
        assert!(config.set("defaults.model", "genius").is_err());
        assert!(config.set("api.provider", "midjourney").is_err());
        assert!(config.set("api.timeout_secs", "0").is_err());
        assert!(config.set("tui.theme", "dark").is_err());

        config.set("api.base_url", "http://localhost:9000/").unwrap();
        assert_eq!(config.base_url(), "http://localhost:9000");
        config.set("api.base_url", "default").unwrap();
        assert_eq!(config.base_url(), ProviderKind::DeepAi.default_base_url());
    }

    #[test]
    fn api_key_is_masked() {
        let mut config = Config::default();
        assert_eq!(config.get("api.key"), None);
        config.set("api.key", "secret").unwrap();
        assert_eq!(config.get("api.key").as_deref(), Some("****"));
    }
}
