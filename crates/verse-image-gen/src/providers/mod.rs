//! Provider registry
//!
//! Maps provider names to concrete implementations.

pub mod mock;
pub mod openai;

use crate::config::VerseConfig;
use crate::provider::ImageProvider;
use verse_core::{Result, VerseError};

/// Create a provider by name with configuration
pub fn create_provider(name: &str, config: &VerseConfig) -> Result<Box<dyn ImageProvider>> {
    match name {
        "mock" => Ok(Box::new(mock::MockProvider::new())),
        "openai" => Ok(Box::new(openai::OpenAiProvider::from_config(config)?)),
        _ => Err(VerseError::Config(format!(
            "Unknown provider '{}'. Available: {}",
            name,
            available_providers().join(", ")
        ))),
    }
}

/// List all available provider names
pub fn available_providers() -> Vec<&'static str> {
    vec!["openai", "mock"]
}
