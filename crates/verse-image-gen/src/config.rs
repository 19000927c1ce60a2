//! Layered tool configuration
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `OPENAI_API_KEY`, `VERSE_IMAGES_API_URL`
//! 2. Project-local: `<root>/.verse/config.toml`
//! 3. Global: `~/.verse/config.toml`
//!
//! Command-line values are applied on top by the caller.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use verse_core::{Result, VerseError};

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const API_URL_ENV: &str = "VERSE_IMAGES_API_URL";

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/images/generations";
pub const DEFAULT_MODEL: &str = "dall-e-3";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_RETRY_LIMIT: u32 = 3;
const DEFAULT_PACING_SECS: u64 = 2;
const DEFAULT_BACKOFF_SECS: u64 = 5;

/// `[provider]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    /// Per-request timeout for generation and download calls
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// `[generation]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub retry_limit: Option<u32>,
    #[serde(default)]
    pub pacing_secs: Option<u64>,
    #[serde(default)]
    pub backoff_secs: Option<u64>,
    #[serde(default)]
    pub manifest: Option<bool>,
}

/// Config file structure; also the resolved configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerseConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

impl VerseConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load(project_root: &Path) -> Result<Self> {
        let mut config = VerseConfig::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                config.merge(Self::load_file(&global_path)?);
            }
        }

        let local_path = Self::project_config_path(project_root);
        if local_path.exists() {
            config.merge(Self::load_file(&local_path)?);
        }

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn project_config_path(project_root: &Path) -> PathBuf {
        project_root.join(".verse").join("config.toml")
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".verse").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            VerseError::Config(format!("Failed to parse config {}: {}", path.display(), e))
        })
    }

    fn merge(&mut self, overlay: VerseConfig) {
        let VerseConfig {
            provider,
            generation,
        } = overlay;

        if provider.api_key.is_some() {
            self.provider.api_key = provider.api_key;
        }
        if provider.api_url.is_some() {
            self.provider.api_url = provider.api_url;
        }
        if provider.model.is_some() {
            self.provider.model = provider.model;
        }
        if provider.timeout_secs.is_some() {
            self.provider.timeout_secs = provider.timeout_secs;
        }

        if generation.retry_limit.is_some() {
            self.generation.retry_limit = generation.retry_limit;
        }
        if generation.pacing_secs.is_some() {
            self.generation.pacing_secs = generation.pacing_secs;
        }
        if generation.backoff_secs.is_some() {
            self.generation.backoff_secs = generation.backoff_secs;
        }
        if generation.manifest.is_some() {
            self.generation.manifest = generation.manifest;
        }
    }

    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.provider.api_key = Some(key);
        }
        if let Some(url) = lookup(API_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.provider.api_url = Some(url);
        }
    }

    /// Replace the credential (from `--api-key`)
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.provider.api_key = Some(key);
        }
        self
    }

    pub fn api_key(&self) -> Option<&str> {
        self.provider.api_key.as_deref()
    }

    pub fn api_url(&self) -> &str {
        self.provider.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn model(&self) -> &str {
        self.provider.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.provider.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn retry_limit(&self) -> u32 {
        self.generation.retry_limit.unwrap_or(DEFAULT_RETRY_LIMIT)
    }

    pub fn pacing_delay(&self) -> Duration {
        Duration::from_secs(self.generation.pacing_secs.unwrap_or(DEFAULT_PACING_SECS))
    }

    pub fn backoff_unit(&self) -> Duration {
        Duration::from_secs(self.generation.backoff_secs.unwrap_or(DEFAULT_BACKOFF_SECS))
    }

    pub fn manifest_enabled(&self) -> bool {
        self.generation.manifest.unwrap_or(true)
    }
}
