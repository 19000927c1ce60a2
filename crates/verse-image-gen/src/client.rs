//! Single-illustration generation with retry, pacing and skip-if-present
//!
//! For each id the client first checks the output path. An existing file is
//! a finished illustration and the provider is not contacted. Otherwise the
//! provider is called up to `retry_limit` times, waiting `n * backoff_unit`
//! after failed attempt `n`. A successful download is written to a temporary
//! sibling and renamed into place, so a file under its final name is always
//! complete.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};
use verse_core::{ContentHash, OutputId, Result, VerseError};

use crate::manifest::{now_rfc3339, ManifestEntry, ThemeManifest, MANIFEST_FILE};
use crate::prompt::compose;
use crate::provider::{GeneratedImage, ImageProvider, ImageRequest};
use crate::settings::GenerationSettings;

/// What happened to one illustration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Already on disk; the provider was not contacted
    Skipped,
    Generated { attempts: u32, bytes: usize },
    Failed { attempts: u32, error: String },
    /// Stopped by an interrupt before the illustration was written
    Interrupted { attempts: u32 },
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Skipped | ItemOutcome::Generated { .. })
    }
}

pub struct GenerationClient<'a> {
    provider: &'a dyn ImageProvider,
    settings: &'a GenerationSettings,
    theme: String,
    output_dir: PathBuf,
    interrupt: Option<&'a AtomicBool>,
    sleeper: Box<dyn Fn(Duration) + 'a>,
}

impl<'a> GenerationClient<'a> {
    /// Create a client writing to `output_dir` (created if missing)
    pub fn new(
        provider: &'a dyn ImageProvider,
        settings: &'a GenerationSettings,
        theme: &str,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;
        debug!(dir = %output_dir.display(), "Output directory ready");
        Ok(Self {
            provider,
            settings,
            theme: theme.to_string(),
            output_dir,
            interrupt: None,
            sleeper: Box::new(pause),
        })
    }

    /// Stop before the next attempt once `flag` is set
    pub fn with_interrupt(mut self, flag: &'a AtomicBool) -> Self {
        self.interrupt = Some(flag);
        self
    }

    /// Replace the function used for pacing and backoff waits
    pub fn with_sleeper(mut self, sleeper: impl Fn(Duration) + 'a) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn output_path(&self, id: &OutputId) -> PathBuf {
        self.output_dir.join(id)
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupt
            .map(|flag| flag.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// Generate one illustration unless it already exists
    pub fn generate_one(&self, id: &OutputId, scene_text: &str) -> ItemOutcome {
        let output_path = self.output_path(id);
        if output_path.exists() {
            info!(%id, "Skipping (already exists)");
            return ItemOutcome::Skipped;
        }

        let retry_limit = self.settings.retry_limit.max(1);
        let mut last_error = String::new();

        for attempt in 1..=retry_limit {
            if self.is_interrupted() {
                return ItemOutcome::Interrupted {
                    attempts: attempt - 1,
                };
            }

            let prompt = compose(scene_text, &self.settings.style_modifier);
            if attempt == 1 {
                info!(%id, scene = %preview(scene_text), "Generating");
                debug!(%id, %prompt, "Full prompt");
            }

            match self.attempt(id, &prompt, &output_path, attempt) {
                Ok(bytes) => {
                    info!(%id, kb = bytes / 1024, attempt, "Generated");
                    (self.sleeper)(self.settings.pacing_delay);
                    return ItemOutcome::Generated {
                        attempts: attempt,
                        bytes,
                    };
                }
                Err(e) => {
                    warn!(%id, attempt, retry_limit, error = %e, "Generation attempt failed");
                    last_error = e.to_string();
                    if attempt < retry_limit {
                        let wait = self.settings.backoff_unit * attempt;
                        info!(%id, wait_secs = wait.as_secs(), "Waiting before retry");
                        (self.sleeper)(wait);
                    }
                }
            }
        }

        ItemOutcome::Failed {
            attempts: retry_limit,
            error: last_error,
        }
    }

    fn attempt(
        &self,
        id: &OutputId,
        prompt: &str,
        output_path: &Path,
        attempt: u32,
    ) -> Result<usize> {
        let request = ImageRequest::new(prompt, self.settings);
        let image = self.provider.generate(&request)?;
        let bytes = self.provider.fetch(&image)?;
        if bytes.is_empty() {
            return Err(VerseError::MalformedResponse("empty image".to_string()));
        }

        write_atomically(output_path, &bytes)?;

        if self.settings.record_manifest {
            if let Err(e) = self.record(id, &request, &image, &bytes, attempt) {
                warn!(%id, error = %e, "Failed to update manifest");
            }
        }

        Ok(bytes.len())
    }

    fn record(
        &self,
        id: &OutputId,
        request: &ImageRequest,
        image: &GeneratedImage,
        bytes: &[u8],
        attempts: u32,
    ) -> Result<()> {
        let path = self.output_dir.join(MANIFEST_FILE);
        let mut manifest = ThemeManifest::load_or_new(&path, &self.theme)?;
        manifest.upsert(ManifestEntry {
            id: id.clone(),
            provider: self.provider.name().to_string(),
            model: request.model.clone(),
            size: request.size,
            quality: request.quality,
            style: request.style,
            prompt: request.prompt.clone(),
            revised_prompt: image.revised_prompt.clone(),
            content_hash: ContentHash::of(bytes).to_prefixed_hex(),
            generated_at: now_rfc3339(),
            attempts,
        });
        manifest.save(&path)
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let partial = path.with_file_name(format!(".{}.part", file_name));

    if let Err(e) = std::fs::write(&partial, bytes).and_then(|_| std::fs::rename(&partial, path)) {
        std::fs::remove_file(&partial).ok();
        return Err(e.into());
    }
    Ok(())
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        std::thread::sleep(duration);
    }
}

fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    let mut preview: String = line.chars().take(80).collect();
    if line.chars().count() > 80 || text.lines().nth(1).is_some() {
        preview.push_str("...");
    }
    preview
}
