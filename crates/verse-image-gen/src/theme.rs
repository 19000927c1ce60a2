//! Theme profiles
//!
//! A theme lives in `docs/themes/<name>.yml`. Only the generation block is
//! read; everything else in the file belongs to the site and is ignored:
//!
//! ```yaml
//! theme:
//!   generation:
//!     style_modifier: |
//!       Traditional Indian devotional art, gold leaf accents
//!     dalle_params:
//!       size: 1024x1792
//!       quality: hd
//!       style: vivid
//! ```

use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};
use verse_core::{Result, VerseError};

use crate::settings::{ImageQuality, ImageSize, ImageStyle};

/// Visual-style profile applied to every illustration of a theme
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeProfile {
    pub name: String,
    pub style_modifier: Option<String>,
    pub size: Option<ImageSize>,
    pub quality: Option<ImageQuality>,
    pub style: Option<ImageStyle>,
}

#[derive(Debug, Default, Deserialize)]
struct ThemeFile {
    #[serde(default)]
    theme: ThemeSection,
}

#[derive(Debug, Default, Deserialize)]
struct ThemeSection {
    #[serde(default)]
    generation: GenerationSection,
}

#[derive(Debug, Default, Deserialize)]
struct GenerationSection {
    #[serde(default)]
    style_modifier: Option<String>,
    #[serde(default)]
    dalle_params: ProviderParams,
}

/// Kept as text so one bad value does not discard the whole theme
#[derive(Debug, Default, Deserialize)]
struct ProviderParams {
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    quality: Option<String>,
    #[serde(default)]
    style: Option<String>,
}

impl ThemeProfile {
    /// Parse a theme from YAML text
    pub fn from_yaml(name: &str, content: &str) -> Result<Self> {
        let file: ThemeFile = if content.trim().is_empty() {
            ThemeFile::default()
        } else {
            serde_yaml::from_str(content)?
        };
        let generation = file.theme.generation;
        let params = generation.dalle_params;

        Ok(Self {
            name: name.to_string(),
            style_modifier: generation
                .style_modifier
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            size: parse_param(name, params.size.as_deref()),
            quality: parse_param(name, params.quality.as_deref()),
            style: parse_param(name, params.style.as_deref()),
        })
    }

    /// Load a theme from a YAML file
    pub fn load(path: &Path, name: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(name, &content).map_err(|e| match e {
            VerseError::YamlParseError(msg) => {
                VerseError::YamlParseError(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Find the theme `name` in `themes_dir`.
    ///
    /// A missing file means the theme has no profile. A file that cannot be
    /// read or parsed is reported and treated the same way.
    pub fn find(themes_dir: &Path, name: &str) -> Option<Self> {
        let path = themes_dir.join(format!("{}.yml", name));
        if !path.exists() {
            return None;
        }
        match Self::load(&path, name) {
            Ok(theme) => {
                info!(path = %path.display(), "Loaded theme configuration");
                Some(theme)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load theme config, using defaults");
                None
            }
        }
    }
}

fn parse_param<T>(theme: &str, value: Option<&str>) -> Option<T>
where
    T: std::str::FromStr<Err = VerseError>,
{
    match value?.parse() {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(%theme, error = %e, "Ignoring theme setting");
            None
        }
    }
}

/// Check that a theme name only uses lowercase letters, digits and hyphens
pub fn validate_theme_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(VerseError::InvalidThemeName(name.to_string()))
    }
}
