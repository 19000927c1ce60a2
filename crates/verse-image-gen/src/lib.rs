//! Verse Image Gen - themed illustration pipeline for verse documents
//!
//! Parses a prompts document into scene descriptions, orders them, merges
//! each with a theme's visual style and drives an image provider through a
//! resumable, idempotent batch that writes one file per illustration.

pub mod client;
pub mod config;
pub mod document;
pub mod layout;
pub mod manifest;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod run;
pub mod sequence;
pub mod settings;
pub mod theme;

#[cfg(test)]
mod testing;

pub use client::{GenerationClient, ItemOutcome};
pub use config::VerseConfig;
pub use document::{SceneMap, VerseFormat};
pub use layout::ProjectLayout;
pub use manifest::{ManifestEntry, ThemeManifest};
pub use provider::{GeneratedImage, ImageProvider, ImageRequest, ProviderStatus};
pub use run::{
    force_clear, regenerate_subset, run_all, ClearOutcome, RegenerateOutcome, RunResult,
    RunSummary,
};
pub use settings::{GenerationSettings, ImageQuality, ImageSize, ImageStyle, SettingsOverrides};
pub use theme::ThemeProfile;
