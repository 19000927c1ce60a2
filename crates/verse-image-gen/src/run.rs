//! Batch runs and pre-run cleanup
//!
//! A run walks the canonical sequence in order and hands every id to the
//! generation client. One item failing never stops the batch; only an
//! interrupt does, and everything written before it stays valid, so the run
//! can be resumed with `--start-from`.

use std::path::Path;

use tracing::{info, warn};
use verse_core::{OutputId, Result, VerseError};

use crate::client::{GenerationClient, ItemOutcome};
use crate::document::SceneMap;

/// Outcome of a batch run, in processing order
#[derive(Debug, Default)]
pub struct RunResult {
    pub items: Vec<(OutputId, ItemOutcome)>,
    /// First id that was not processed because of an interrupt
    pub interrupted_at: Option<OutputId>,
    /// An interrupt arrived, possibly during the last item
    pub interrupted: bool,
}

impl RunResult {
    pub fn generated(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Generated { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Failed { .. }))
    }

    pub fn succeeded(&self) -> usize {
        self.count(ItemOutcome::is_success)
    }

    pub fn failed_ids(&self) -> Vec<&OutputId> {
        self.items
            .iter()
            .filter(|(_, o)| matches!(o, ItemOutcome::Failed { .. }))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted || self.interrupted_at.is_some()
    }

    /// Every item of the sequence was processed and none failed
    pub fn all_succeeded(&self) -> bool {
        !self.is_interrupted() && self.failed() == 0
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            processed: self.items.len(),
            generated: self.generated(),
            skipped: self.skipped(),
            failed: self.failed(),
            failed_ids: self.failed_ids().into_iter().cloned().collect(),
        }
    }

    fn count(&self, pred: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.items.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Counts reported at the end of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub generated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failed_ids: Vec<OutputId>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.generated + self.skipped
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} succeeded ({} generated, {} skipped), {} failed",
            self.succeeded(),
            self.processed,
            self.generated,
            self.skipped,
            self.failed
        )
    }
}

/// Generate every illustration in `sequence`, in order
pub fn run_all(sequence: &[OutputId], scenes: &SceneMap, client: &GenerationClient) -> RunResult {
    let total = sequence.len();
    let mut result = RunResult::default();

    for (index, id) in sequence.iter().enumerate() {
        if client.is_interrupted() {
            result.interrupted_at = Some(id.clone());
            break;
        }

        info!("[{}/{}] {}", index + 1, total, id);
        let outcome = match scenes.get(id) {
            Some(scene) => client.generate_one(id, scene),
            None => ItemOutcome::Failed {
                attempts: 0,
                error: VerseError::NotFound(id.as_ref().to_path_buf()).to_string(),
            },
        };

        if let ItemOutcome::Interrupted { .. } = outcome {
            result.interrupted_at = Some(id.clone());
            break;
        }
        if let ItemOutcome::Failed { error, .. } = &outcome {
            warn!(%id, %error, "Giving up on illustration");
        }
        result.items.push((id.clone(), outcome));
    }
    result.interrupted = client.is_interrupted();

    info!(
        succeeded = result.succeeded(),
        generated = result.generated(),
        skipped = result.skipped(),
        failed = result.failed(),
        total,
        "Run finished"
    );
    result
}

/// Result of the `--force` pre-step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearOutcome {
    /// The theme directory does not exist yet
    NoDirectory,
    /// The theme directory holds no illustrations
    NothingToClear,
    /// The theme directory was deleted
    Cleared { removed: usize },
    /// The operator declined; nothing was touched
    Aborted,
}

/// Delete every illustration of a theme after confirmation.
///
/// `confirm` receives the number of illustrations and the directory; it is
/// only called when there is something to delete.
pub fn force_clear(
    theme_dir: &Path,
    confirm: impl FnOnce(usize, &Path) -> Result<bool>,
) -> Result<ClearOutcome> {
    if !theme_dir.is_dir() {
        info!(dir = %theme_dir.display(), "Theme directory not found, generating everything");
        return Ok(ClearOutcome::NoDirectory);
    }

    let existing = count_images(theme_dir)?;
    if existing == 0 {
        info!("No existing images found, generating everything");
        return Ok(ClearOutcome::NothingToClear);
    }

    if !confirm(existing, theme_dir)? {
        info!("Aborted, no images were deleted");
        return Ok(ClearOutcome::Aborted);
    }

    std::fs::remove_dir_all(theme_dir)?;
    info!(dir = %theme_dir.display(), removed = existing, "Deleted theme directory");
    Ok(ClearOutcome::Cleared { removed: existing })
}

fn count_images(dir: &Path) -> Result<usize> {
    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "png") {
            count += 1;
        }
    }
    Ok(count)
}

/// Result of the `--regenerate` pre-step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegenerateOutcome {
    pub deleted: Vec<OutputId>,
    /// Named ids that had no file; they are generated like any missing item
    pub not_found: Vec<OutputId>,
}

/// Delete the named illustrations so the next run generates them again
pub fn regenerate_subset(theme_dir: &Path, ids: &[OutputId]) -> Result<RegenerateOutcome> {
    if !theme_dir.is_dir() {
        return Err(VerseError::NotFound(theme_dir.to_path_buf()));
    }

    let mut outcome = RegenerateOutcome::default();
    for id in ids {
        let path = theme_dir.join(id);
        if path.exists() {
            std::fs::remove_file(&path)?;
            info!(%id, "Deleted");
            outcome.deleted.push(id.clone());
        } else {
            warn!(%id, "Not found, will generate");
            outcome.not_found.push(id.clone());
        }
    }
    Ok(outcome)
}

/// Which illustrations of `sequence` exist in `theme_dir`
pub fn inspect(theme_dir: &Path, sequence: &[OutputId]) -> Vec<(OutputId, bool)> {
    sequence
        .iter()
        .map(|id| (id.clone(), theme_dir.join(id).is_file()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;
    use crate::sequence::canonical_order;
    use crate::testing::{fast_settings, temp_dir, ScriptedProvider};
    use std::sync::atomic::AtomicBool;

    fn chalisa_scenes(verses: u32) -> SceneMap {
        let mut doc = String::from("### Title Page\n**Scene Description**: title scene\n");
        for v in 1..=verses {
            doc.push_str(&format!(
                "\n### Verse {}:\n**Scene Description**: scene for verse {}\n---\n",
                v, v
            ));
        }
        parse_document(&doc)
    }

    fn names(ids: &[&OutputId]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_run_generates_in_sequence_order() {
        let dir = temp_dir("verse_run_test");
        let scenes = chalisa_scenes(3);
        let sequence = canonical_order(&scenes);
        let provider = ScriptedProvider::new();
        let settings = fast_settings("", 3);
        let client = GenerationClient::new(&provider, &settings, "t", &dir).unwrap();

        let result = run_all(&sequence, &scenes, &client);

        let processed: Vec<&OutputId> = result.items.iter().map(|(id, _)| id).collect();
        assert_eq!(
            names(&processed),
            ["title-page.png", "verse-01.png", "verse-02.png", "verse-03.png"]
        );
        assert_eq!(
            *provider.prompts.borrow(),
            [
                "title scene",
                "scene for verse 1",
                "scene for verse 2",
                "scene for verse 3"
            ]
        );
        assert_eq!(result.generated(), 4);
        assert!(result.all_succeeded());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_second_run_makes_no_provider_calls() {
        let dir = temp_dir("verse_run_test");
        let scenes = chalisa_scenes(5);
        let sequence = canonical_order(&scenes);
        let settings = fast_settings("", 3);

        let first = ScriptedProvider::new();
        let client = GenerationClient::new(&first, &settings, "t", &dir).unwrap();
        assert!(run_all(&sequence, &scenes, &client).all_succeeded());
        assert_eq!(first.calls.get(), 6);

        let second = ScriptedProvider::new();
        let client = GenerationClient::new(&second, &settings, "t", &dir).unwrap();
        let result = run_all(&sequence, &scenes, &client);

        assert_eq!(second.calls.get(), 0);
        assert_eq!(result.skipped(), 6);
        assert_eq!(result.succeeded(), sequence.len());
        assert!(result.all_succeeded());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_failing_item_does_not_stop_batch() {
        let dir = temp_dir("verse_run_test");
        let scenes = chalisa_scenes(3);
        let sequence = canonical_order(&scenes);
        let provider = ScriptedProvider::poisoned("verse 2");
        let settings = fast_settings("", 3);
        let client = GenerationClient::new(&provider, &settings, "t", &dir).unwrap();

        let result = run_all(&sequence, &scenes, &client);

        assert_eq!(result.items.len(), 4);
        assert_eq!(result.failed(), 1);
        assert_eq!(result.generated(), 3);
        assert_eq!(names(&result.failed_ids()), ["verse-02.png"]);
        let summary = result.summary();
        assert_eq!(summary.failed_ids, vec![OutputId::verse(2)]);
        assert_eq!(
            summary.to_string(),
            "3/4 succeeded (3 generated, 0 skipped), 1 failed"
        );
        assert_eq!(provider.per_prompt_calls.borrow()["scene for verse 2"], 3);
        assert_eq!(provider.calls.get(), 3 + 3);
        assert!(dir.join("verse-03.png").exists());
        assert!(!result.all_succeeded());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_interrupt_stops_between_items() {
        let dir = temp_dir("verse_run_test");
        let scenes = chalisa_scenes(2);
        let sequence = canonical_order(&scenes);
        let provider = ScriptedProvider::new();
        let settings = fast_settings("", 3);
        let flag = AtomicBool::new(true);
        let client = GenerationClient::new(&provider, &settings, "t", &dir)
            .unwrap()
            .with_interrupt(&flag);

        let result = run_all(&sequence, &scenes, &client);

        assert!(result.is_interrupted());
        assert_eq!(result.interrupted_at, Some(OutputId::title_page()));
        assert!(result.items.is_empty());
        assert_eq!(provider.calls.get(), 0);
        assert!(!result.all_succeeded());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_interrupt_during_last_item_is_reported() {
        let dir = temp_dir("verse_run_test");
        let scenes = chalisa_scenes(1);
        let sequence = canonical_order(&scenes);
        let provider = ScriptedProvider::new();
        let settings = fast_settings("", 1);
        let flag = AtomicBool::new(false);
        let last = sequence.len();
        let client = GenerationClient::new(&provider, &settings, "t", &dir)
            .unwrap()
            .with_interrupt(&flag)
            .with_sleeper(|_| {
                if provider.calls.get() == last {
                    flag.store(true, std::sync::atomic::Ordering::SeqCst);
                }
            });

        let result = run_all(&sequence, &scenes, &client);

        assert_eq!(result.generated(), last);
        assert_eq!(result.interrupted_at, None);
        assert!(result.is_interrupted());
        assert!(!result.all_succeeded());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_resumed_run_only_touches_tail() {
        let dir = temp_dir("verse_run_test");
        let scenes = chalisa_scenes(4);
        let sequence = canonical_order(&scenes);
        let resumed = crate::sequence::resume_from(sequence.clone(), Some(&OutputId::verse(3)));
        let provider = ScriptedProvider::new();
        let settings = fast_settings("", 1);
        let client = GenerationClient::new(&provider, &settings, "t", &dir).unwrap();

        let result = run_all(&resumed, &scenes, &client);

        assert_eq!(result.items.len(), 2);
        assert!(!dir.join("verse-01.png").exists());
        assert!(dir.join("verse-03.png").exists());
        assert!(dir.join("verse-04.png").exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_force_declined_leaves_files() {
        let dir = temp_dir("verse_run_test");
        std::fs::write(dir.join("verse-01.png"), b"a").unwrap();
        std::fs::write(dir.join("verse-02.png"), b"b").unwrap();
        std::fs::write(dir.join("notes.txt"), b"c").unwrap();

        let mut asked = None;
        let outcome = force_clear(&dir, |count, _| {
            asked = Some(count);
            Ok(false)
        })
        .unwrap();

        assert_eq!(outcome, ClearOutcome::Aborted);
        assert_eq!(asked, Some(2));
        assert!(dir.join("verse-01.png").exists());
        assert!(dir.join("verse-02.png").exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_force_confirmed_deletes_directory() {
        let root = temp_dir("verse_run_test");
        let dir = root.join("watercolor");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("verse-01.png"), b"a").unwrap();

        let outcome = force_clear(&dir, |_, _| Ok(true)).unwrap();
        assert_eq!(outcome, ClearOutcome::Cleared { removed: 1 });
        assert!(!dir.exists());

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_force_without_images_does_not_ask() {
        let root = temp_dir("verse_run_test");
        let missing = root.join("missing");
        let ask = |_: usize, _: &Path| -> Result<bool> { panic!("should not ask") };
        assert_eq!(force_clear(&missing, ask).unwrap(), ClearOutcome::NoDirectory);
        assert_eq!(force_clear(&root, ask).unwrap(), ClearOutcome::NothingToClear);
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_confirmation_error_propagates() {
        let dir = temp_dir("verse_run_test");
        std::fs::write(dir.join("verse-01.png"), b"a").unwrap();
        let result = force_clear(&dir, |_, _| {
            Err(VerseError::Config("no terminal".to_string()))
        });
        assert!(matches!(result, Err(VerseError::Config(_))));
        assert!(dir.join("verse-01.png").exists());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_regenerate_subset_then_run() {
        let dir = temp_dir("verse_run_test");
        let mut doc = String::new();
        for v in 1..=10 {
            doc.push_str(&format!("### Verse {}:\n**Scene Description**: verse {}\n", v, v));
        }
        let scenes = parse_document(&doc);
        let sequence = canonical_order(&scenes);
        for id in &sequence {
            std::fs::write(dir.join(id), b"original").unwrap();
        }

        let targets = [OutputId::verse(5), OutputId::verse(9)];
        let outcome = regenerate_subset(&dir, &targets).unwrap();
        assert_eq!(outcome.deleted, targets.to_vec());
        assert!(outcome.not_found.is_empty());
        assert!(!dir.join("verse-05.png").exists());
        assert_eq!(std::fs::read(dir.join("verse-04.png")).unwrap(), b"original");

        let provider = ScriptedProvider::new();
        let settings = fast_settings("", 3);
        let client = GenerationClient::new(&provider, &settings, "t", &dir).unwrap();
        let result = run_all(&sequence, &scenes, &client);

        assert_eq!(provider.calls.get(), 2);
        assert_eq!(*provider.prompts.borrow(), ["verse 5", "verse 9"]);
        assert_eq!(result.generated(), 2);
        assert_eq!(result.skipped(), 8);
        assert_ne!(std::fs::read(dir.join("verse-05.png")).unwrap(), b"original");
        assert_eq!(std::fs::read(dir.join("verse-10.png")).unwrap(), b"original");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_regenerate_reports_missing_files() {
        let dir = temp_dir("verse_run_test");
        let outcome = regenerate_subset(&dir, &[OutputId::verse(7)]).unwrap();
        assert!(outcome.deleted.is_empty());
        assert_eq!(outcome.not_found, vec![OutputId::verse(7)]);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_regenerate_requires_theme_dir() {
        let root = temp_dir("verse_run_test");
        let err = regenerate_subset(&root.join("nope"), &[OutputId::verse(1)]).unwrap_err();
        assert!(matches!(err, VerseError::NotFound(_)));
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_mock_provider_writes_pngs() {
        let dir = temp_dir("verse_run_test");
        let doc = "\
### Chapter 2, Verse 47: Karma Yoga
**Scene Description**: Arjuna at dawn
---
### Chapter 1, Verse 1
**Scene Description**: The battlefield
";
        let scenes = parse_document(doc);
        let sequence = canonical_order(&scenes);
        let provider = crate::providers::mock::MockProvider::new();
        let settings = fast_settings("watercolor", 1);
        let client = GenerationClient::new(&provider, &settings, "t", &dir).unwrap();

        let result = run_all(&sequence, &scenes, &client);

        assert_eq!(result.generated(), 2);
        let first = &result.items[0].0;
        assert_eq!(first.as_str(), "chapter-01-verse-01.png");
        let img = image::open(dir.join(first)).unwrap();
        assert_eq!((img.width(), img.height()), (128, 224));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_inspect() {
        let dir = temp_dir("verse_run_test");
        std::fs::write(dir.join("verse-01.png"), b"a").unwrap();
        let status = inspect(&dir, &[OutputId::verse(1), OutputId::verse(2)]);
        assert_eq!(
            status,
            vec![(OutputId::verse(1), true), (OutputId::verse(2), false)]
        );
        std::fs::remove_dir_all(&dir).ok();
    }
}
