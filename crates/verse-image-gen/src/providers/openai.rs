//! OpenAI image generation provider (DALL-E 3)
//!
//! `generate()` posts to the images endpoint and blocks until the provider
//! answers with a URL; `fetch()` downloads that URL. Neither retries: the
//! generation client owns the retry loop.

use crate::config::VerseConfig;
use crate::provider::*;
use serde_json::json;
use std::io::Read;
use std::time::Duration;
use tracing::debug;
use verse_core::{Result, VerseError};

/// OpenAI provider for illustration generation
pub struct OpenAiProvider {
    api_key: String,
    api_url: String,
    agent: ureq::Agent,
}

impl OpenAiProvider {
    /// Create a new OpenAiProvider from config
    pub fn from_config(config: &VerseConfig) -> Result<Self> {
        let api_key = config
            .api_key()
            .ok_or_else(|| {
                VerseError::MissingApiKey(
                    "Pass --api-key, set OPENAI_API_KEY, or add api_key to .verse/config.toml"
                        .to_string(),
                )
            })?
            .to_string();

        Ok(Self {
            api_key,
            api_url: config.api_url().to_string(),
            agent: build_agent(config.request_timeout()),
        })
    }
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build();
    config.into()
}

fn transport_error(e: ureq::Error) -> VerseError {
    match e {
        ureq::Error::Timeout(_) => VerseError::Http("request timed out".to_string()),
        other => VerseError::Http(other.to_string()),
    }
}

/// Request body for the images endpoint
pub fn request_payload(request: &ImageRequest) -> serde_json::Value {
    json!({
        "model": request.model,
        "prompt": request.prompt,
        "size": request.size.as_str(),
        "quality": request.quality.as_str(),
        "style": request.style.as_str(),
        "n": 1
    })
}

/// Extract the first image from an images endpoint response
pub fn parse_image_response(response: &serde_json::Value) -> Result<GeneratedImage> {
    let first = response
        .get("data")
        .and_then(|d| d.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| VerseError::MalformedResponse("no images in response".to_string()))?;

    let url = first
        .get("url")
        .and_then(|u| u.as_str())
        .ok_or_else(|| VerseError::MalformedResponse("image has no url".to_string()))?;

    Ok(GeneratedImage {
        url: url.to_string(),
        revised_prompt: first
            .get("revised_prompt")
            .and_then(|p| p.as_str())
            .map(str::to_string),
    })
}

/// Best-effort message from an error response body
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().chars().take(200).collect())
}

impl ImageProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn health_check(&self) -> Result<ProviderStatus> {
        if self.api_key.trim().is_empty() {
            return Ok(ProviderStatus::NoApiKey);
        }
        Ok(ProviderStatus::Available)
    }

    fn generate(&self, request: &ImageRequest) -> Result<GeneratedImage> {
        let payload = request_payload(request);
        debug!(url = %self.api_url, size = %request.size, quality = %request.quality, "Requesting image");

        let mut response = self
            .agent
            .post(&self.api_url)
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .send_json(&payload)
            .map_err(transport_error)?;

        let status = response.status();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(transport_error)?;

        if !status.is_success() {
            return Err(VerseError::Provider(format!(
                "HTTP {}: {}",
                status.as_u16(),
                error_message(&body)
            )));
        }

        let json: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| VerseError::MalformedResponse(format!("invalid JSON: {}", e)))?;
        parse_image_response(&json)
    }

    fn fetch(&self, image: &GeneratedImage) -> Result<Vec<u8>> {
        let response = self.agent.get(&image.url).call().map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerseError::Http(format!(
                "image download failed with HTTP {}",
                status.as_u16()
            )));
        }

        let mut reader = response.into_body().into_reader();
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| VerseError::Http(format!("Failed to read image data: {}", e)))?;
        Ok(bytes)
    }
}
