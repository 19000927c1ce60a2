//! Immutable generation settings for one run
//!
//! Provider parameters come from three places, highest precedence first:
//! explicit command-line values, the theme profile, built-in defaults.
//! They are resolved once into a [`GenerationSettings`] that is passed by
//! reference to the generation client and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use verse_core::{Result, VerseError};

use crate::config::VerseConfig;
use crate::theme::ThemeProfile;

/// Output dimensions accepted by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageSize {
    #[serde(rename = "1024x1024")]
    Square,
    /// Portrait; cropped to 1024x1536 for the final pages
    #[default]
    #[serde(rename = "1024x1792")]
    Portrait,
    #[serde(rename = "1792x1024")]
    Landscape,
}

impl ImageSize {
    pub const ALL: [ImageSize; 3] = [ImageSize::Square, ImageSize::Portrait, ImageSize::Landscape];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Square => "1024x1024",
            ImageSize::Portrait => "1024x1792",
            ImageSize::Landscape => "1792x1024",
        }
    }

    /// `(width, height)` in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            ImageSize::Square => (1024, 1024),
            ImageSize::Portrait => (1024, 1792),
            ImageSize::Landscape => (1792, 1024),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageQuality {
    #[default]
    Standard,
    /// Twice the cost of standard
    Hd,
}

impl ImageQuality {
    pub const ALL: [ImageQuality; 2] = [ImageQuality::Standard, ImageQuality::Hd];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageQuality::Standard => "standard",
            ImageQuality::Hd => "hd",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStyle {
    #[default]
    Natural,
    Vivid,
}

impl ImageStyle {
    pub const ALL: [ImageStyle; 2] = [ImageStyle::Natural, ImageStyle::Vivid];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageStyle::Natural => "natural",
            ImageStyle::Vivid => "vivid",
        }
    }
}

macro_rules! enumerated_param {
    ($ty:ty, $field:literal) => {
        impl FromStr for $ty {
            type Err = VerseError;

            fn from_str(s: &str) -> Result<Self> {
                let s = s.trim();
                <$ty>::ALL
                    .into_iter()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| VerseError::InvalidParameter {
                        field: $field.to_string(),
                        value: s.to_string(),
                        allowed: <$ty>::ALL.iter().map(|v| v.as_str().to_string()).collect(),
                    })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

enumerated_param!(ImageSize, "size");
enumerated_param!(ImageQuality, "quality");
enumerated_param!(ImageStyle, "style");

/// Values given explicitly on the command line; `None` means "not given"
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub style_modifier: Option<String>,
    pub size: Option<ImageSize>,
    pub quality: Option<ImageQuality>,
    pub style: Option<ImageStyle>,
    pub retry_limit: Option<u32>,
}

/// Everything the generation client needs to know about a run
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub model: String,
    pub size: ImageSize,
    pub quality: ImageQuality,
    pub style: ImageStyle,
    /// Appended to every prompt as `Visual Style: ...`; may be empty
    pub style_modifier: String,
    /// Provider calls per item before it is recorded as failed
    pub retry_limit: u32,
    /// Sleep after every successful generation
    pub pacing_delay: Duration,
    /// Attempt `n` failing waits `n * backoff_unit` before the next attempt
    pub backoff_unit: Duration,
    /// Record provenance in `<theme>/manifest.toml`
    pub record_manifest: bool,
}

impl GenerationSettings {
    /// Resolve the settings for a run
    pub fn resolve(
        overrides: &SettingsOverrides,
        theme: Option<&ThemeProfile>,
        config: &VerseConfig,
    ) -> Self {
        let explicit_style = overrides
            .style_modifier
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        // An explicit style replaces the theme wholesale, image params included
        let theme = if explicit_style.is_some() { None } else { theme };
        let style_modifier = explicit_style
            .or_else(|| theme.and_then(|t| t.style_modifier.clone()))
            .unwrap_or_default();

        let size = pick("size", overrides.size, theme.and_then(|t| t.size));
        let quality = pick("quality", overrides.quality, theme.and_then(|t| t.quality));
        let style = pick("style", overrides.style, theme.and_then(|t| t.style));

        Self {
            model: config.model().to_string(),
            size,
            quality,
            style,
            style_modifier,
            retry_limit: overrides.retry_limit.unwrap_or_else(|| config.retry_limit()),
            pacing_delay: config.pacing_delay(),
            backoff_unit: config.backoff_unit(),
            record_manifest: config.manifest_enabled(),
        }
    }
}

fn pick<T: Copy + Default + fmt::Display>(
    field: &str,
    explicit: Option<T>,
    from_theme: Option<T>,
) -> T {
    match (explicit, from_theme) {
        (Some(value), _) => value,
        (None, Some(value)) => {
            info!(%field, %value, "Using theme setting");
            value
        }
        (None, None) => T::default(),
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self::resolve(&SettingsOverrides::default(), None, &VerseConfig::default())
    }
}
