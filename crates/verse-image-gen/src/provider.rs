//! Image provider trait and request/result types

use serde::{Deserialize, Serialize};
use verse_core::Result;

use crate::settings::{GenerationSettings, ImageQuality, ImageSize, ImageStyle};

/// One image generation request. The provider is always asked for a single
/// image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    pub prompt: String,
    pub model: String,
    pub size: ImageSize,
    pub quality: ImageQuality,
    pub style: ImageStyle,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>, settings: &GenerationSettings) -> Self {
        Self {
            prompt: prompt.into(),
            model: settings.model.clone(),
            size: settings.size,
            quality: settings.quality,
            style: settings.style,
        }
    }
}

/// A generated image, not yet downloaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    /// Where the image bytes can be fetched
    pub url: String,
    /// The prompt as rewritten by the provider, if it reports one
    pub revised_prompt: Option<String>,
}

/// Status returned by a provider health check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderStatus {
    Available,
    Unavailable(String),
    NoApiKey,
}

/// Trait implemented by each image provider (OpenAI, Mock).
///
/// Every error returned from `generate` or `fetch` is treated as retryable
/// by the generation client.
pub trait ImageProvider: Send {
    /// Provider name (e.g. "openai", "mock")
    fn name(&self) -> &str;

    /// Check if the provider can be used (credential present)
    fn health_check(&self) -> Result<ProviderStatus>;

    /// Ask the provider for one image; blocks until the provider answers
    fn generate(&self, request: &ImageRequest) -> Result<GeneratedImage>;

    /// Download the bytes of a generated image
    fn fetch(&self, image: &GeneratedImage) -> Result<Vec<u8>>;
}
