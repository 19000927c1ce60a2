//! Mock provider for offline runs
//!
//! Produces solid-color placeholder PNGs without any network calls. The
//! color is derived from the prompt, so a theme change is visible at a
//! glance. Placeholders are rendered at 1/8 of the requested size.

use crate::provider::*;
use std::io::Cursor;
use verse_core::{Result, VerseError};

const SCALE: u32 = 8;
const SCHEME: &str = "mock://";

/// A mock provider that renders placeholder illustrations locally
#[derive(Default)]
pub struct MockProvider;

impl MockProvider {
    pub fn new() -> Self {
        Self
    }
}

impl ImageProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn health_check(&self) -> Result<ProviderStatus> {
        Ok(ProviderStatus::Available)
    }

    fn generate(&self, request: &ImageRequest) -> Result<GeneratedImage> {
        let (width, height) = request.size.dimensions();
        let [r, g, b] = prompt_color(&request.prompt);
        Ok(GeneratedImage {
            url: format!(
                "{}{}x{}/{:02x}{:02x}{:02x}",
                SCHEME,
                width / SCALE,
                height / SCALE,
                r,
                g,
                b
            ),
            revised_prompt: None,
        })
    }

    fn fetch(&self, image: &GeneratedImage) -> Result<Vec<u8>> {
        let (width, height, rgb) = parse_mock_url(&image.url).ok_or_else(|| {
            VerseError::MalformedResponse(format!("not a mock image url: {}", image.url))
        })?;
        render_png(width, height, rgb)
    }
}

/// A warm, stable color from the prompt text
fn prompt_color(prompt: &str) -> [u8; 3] {
    let hash = prompt
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
    [
        ((hash >> 16) & 0xFF) as u8,
        ((hash >> 8) & 0xFF) as u8,
        (hash & 0xFF) as u8,
    ]
}

fn parse_mock_url(url: &str) -> Option<(u32, u32, [u8; 3])> {
    let rest = url.strip_prefix(SCHEME)?;
    let (dims, color) = rest.split_once('/')?;
    let (w, h) = dims.split_once('x')?;
    if color.len() != 6 || !color.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&color[i..i + 2], 16).ok();
    Some((
        w.parse().ok()?,
        h.parse().ok()?,
        [channel(0)?, channel(2)?, channel(4)?],
    ))
}

fn render_png(width: u32, height: u32, [r, g, b]: [u8; 3]) -> Result<Vec<u8>> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([r, g, b, 255]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| VerseError::Provider(format!("Failed to encode PNG: {}", e)))?;
    Ok(bytes)
}
