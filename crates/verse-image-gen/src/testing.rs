//! Test doubles shared by the client and run tests

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use verse_core::{Result, VerseError};

use crate::provider::*;
use crate::settings::GenerationSettings;

/// Provider that serves fixed bytes, counts calls, and fails on demand.
///
/// Prompts containing a "poison" marker always fail; otherwise the first
/// `fail_first` calls fail.
#[derive(Default)]
pub struct ScriptedProvider {
    pub calls: Cell<usize>,
    pub fail_first: Cell<usize>,
    pub poison: Option<String>,
    pub prompts: RefCell<Vec<String>>,
    pub per_prompt_calls: RefCell<HashMap<String, usize>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_first(n: usize) -> Self {
        let provider = Self::new();
        provider.fail_first.set(n);
        provider
    }

    pub fn poisoned(marker: &str) -> Self {
        Self {
            poison: Some(marker.to_string()),
            ..Self::default()
        }
    }
}

impl ImageProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn health_check(&self) -> Result<ProviderStatus> {
        Ok(ProviderStatus::Available)
    }

    fn generate(&self, request: &ImageRequest) -> Result<GeneratedImage> {
        self.calls.set(self.calls.get() + 1);
        self.prompts.borrow_mut().push(request.prompt.clone());
        *self
            .per_prompt_calls
            .borrow_mut()
            .entry(request.prompt.clone())
            .or_insert(0) += 1;

        if let Some(marker) = &self.poison {
            if request.prompt.contains(marker.as_str()) {
                return Err(VerseError::Provider("HTTP 400: content policy".to_string()));
            }
        }
        if self.fail_first.get() > 0 {
            self.fail_first.set(self.fail_first.get() - 1);
            return Err(VerseError::Http("connection reset".to_string()));
        }
        Ok(GeneratedImage {
            url: format!("scripted://{}", self.calls.get()),
            revised_prompt: Some(format!("revised: {}", request.prompt)),
        })
    }

    fn fetch(&self, image: &GeneratedImage) -> Result<Vec<u8>> {
        Ok(format!("image bytes from {}", image.url).into_bytes())
    }
}

/// Default settings without any sleeping
pub fn fast_settings(style_modifier: &str, retry_limit: u32) -> GenerationSettings {
    GenerationSettings {
        style_modifier: style_modifier.to_string(),
        retry_limit,
        pacing_delay: std::time::Duration::ZERO,
        backoff_unit: std::time::Duration::ZERO,
        ..GenerationSettings::default()
    }
}

pub fn temp_dir(prefix: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("{}_{}", prefix, uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
