//! Provenance manifest for a theme's illustrations
//!
//! `images/<theme>/manifest.toml` records how each illustration was made
//! (prompt, provider, parameters, content hash). It is informational only:
//! whether an illustration is done is decided by the file's existence.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use verse_core::{OutputId, Result};

use crate::settings::{ImageQuality, ImageSize, ImageStyle};

pub const MANIFEST_FILE: &str = "manifest.toml";

/// How one illustration was generated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: OutputId,
    pub provider: String,
    pub model: String,
    pub size: ImageSize,
    pub quality: ImageQuality,
    pub style: ImageStyle,
    pub prompt: String,
    #[serde(default)]
    pub revised_prompt: Option<String>,
    pub content_hash: String,
    pub generated_at: String,
    pub attempts: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeManifest {
    pub theme: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub entries: Vec<ManifestEntry>,
}

/// TOML wrapper
#[derive(Debug, Serialize, Deserialize)]
struct ManifestFile {
    manifest: ThemeManifest,
}

impl ThemeManifest {
    pub fn new(theme: &str) -> Self {
        Self {
            theme: theme.to_string(),
            updated_at: None,
            entries: Vec::new(),
        }
    }

    /// Load manifest from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: ManifestFile = toml::from_str(&content)?;
        Ok(file.manifest)
    }

    /// Load the manifest at `path`, or start a new one for `theme`
    pub fn load_or_new(path: &Path, theme: &str) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::new(theme))
        }
    }

    /// Save manifest to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = ManifestFile {
            manifest: self.clone(),
        };
        std::fs::write(path, toml::to_string_pretty(&file)?)?;
        Ok(())
    }

    /// Insert an entry, replacing any earlier record of the same illustration
    pub fn upsert(&mut self, entry: ManifestEntry) {
        self.updated_at = Some(entry.generated_at.clone());
        match self.entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn get(&self, id: &OutputId) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }
}

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
