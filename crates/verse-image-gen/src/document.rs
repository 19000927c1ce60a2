//! Scene description extraction from the prompts document
//!
//! The prompts document (`docs/image-prompts.md`) is a markdown file whose
//! `###` sections each describe one illustration:
//!
//! ```text
//! ### Chapter 2, Verse 47: Karma Yoga
//!
//! **Scene Description**: Arjuna kneels beside his chariot...
//!
//! ---
//! ```
//!
//! A section runs from its header to the next `###` header, the next `---`
//! rule, or the end of the document.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, warn};
use verse_core::{OutputId, Result, VerseError};

/// Scene descriptions keyed by the illustration they describe
pub type SceneMap = BTreeMap<OutputId, String>;

const LABEL: &str = "Scene Description";

/// What a section header names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionKind {
    TitlePage,
    OpeningDoha(u32),
    ChapterVerse(u32, u32),
    Verse(u32),
    ClosingDoha,
    Other,
}

#[derive(Debug)]
struct Section {
    kind: SectionKind,
    description: Option<String>,
}

/// How verse sections are labelled in a document.
///
/// A document uses one format or the other; the two are never mixed in the
/// output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerseFormat {
    /// `### Chapter 2, Verse 47` sections (e.g. Bhagavad Gita)
    ChapterVerse,
    /// `### Verse 12:` sections (e.g. Hanuman Chalisa)
    SimpleVerse,
}

impl VerseFormat {
    /// Chapter-verse wins as soon as one chapter-verse section carries a
    /// scene description.
    fn detect(sections: &[Section]) -> Self {
        let has_chapters = sections.iter().any(|s| {
            matches!(s.kind, SectionKind::ChapterVerse(..)) && s.description.is_some()
        });
        if has_chapters {
            VerseFormat::ChapterVerse
        } else {
            VerseFormat::SimpleVerse
        }
    }

    /// Output id for a section under this format, `None` when the section is
    /// not part of the document's output.
    fn output_id(self, kind: SectionKind) -> Option<OutputId> {
        match (kind, self) {
            (SectionKind::TitlePage, _) => Some(OutputId::title_page()),
            (SectionKind::OpeningDoha(n), _) => Some(OutputId::opening_doha(n)),
            (SectionKind::ClosingDoha, _) => Some(OutputId::closing_doha()),
            (SectionKind::ChapterVerse(c, v), VerseFormat::ChapterVerse) => {
                Some(OutputId::chapter_verse(c, v))
            }
            (SectionKind::Verse(v), VerseFormat::SimpleVerse) => Some(OutputId::verse(v)),
            _ => None,
        }
    }
}

/// Read and parse the prompts document at `path`
pub fn parse_file(path: &Path) -> Result<SceneMap> {
    if !path.exists() {
        return Err(VerseError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    let scenes = parse_document(&content);
    tracing::info!(
        count = scenes.len(),
        file = %path.display(),
        "Parsed scene descriptions"
    );
    Ok(scenes)
}

/// Extract every scene description from a document.
///
/// Sections without a `Scene Description` label are skipped. When two
/// sections map to the same output id the first one is kept.
pub fn parse_document(content: &str) -> SceneMap {
    let sections = split_sections(content);
    let format = VerseFormat::detect(&sections);
    debug!(?format, sections = sections.len(), "Scanned prompts document");

    let mut scenes = SceneMap::new();
    for section in sections {
        let Some(id) = format.output_id(section.kind) else {
            continue;
        };
        let Some(text) = section.description else {
            debug!(%id, "Section has no scene description");
            continue;
        };
        if scenes.contains_key(&id) {
            warn!(%id, "Duplicate section ignored");
            continue;
        }
        scenes.insert(id, text);
    }
    scenes
}

/// Detect the verse format a document uses
pub fn detect_format(content: &str) -> VerseFormat {
    VerseFormat::detect(&split_sections(content))
}

fn split_sections(content: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Option<(SectionKind, Vec<&str>)> = None;

    for line in content.lines() {
        if line.starts_with("###") {
            if let Some((kind, body)) = current.take() {
                sections.push(Section::new(kind, &body));
            }
            current = Some((classify_header(line), Vec::new()));
        } else if line.starts_with("---") {
            if let Some((kind, body)) = current.take() {
                sections.push(Section::new(kind, &body));
            }
        } else if let Some((_, body)) = current.as_mut() {
            body.push(line);
        }
    }
    if let Some((kind, body)) = current {
        sections.push(Section::new(kind, &body));
    }

    sections
}

impl Section {
    fn new(kind: SectionKind, body: &[&str]) -> Self {
        Self {
            kind,
            description: scene_description(body),
        }
    }
}

fn classify_header(line: &str) -> SectionKind {
    let title = line.trim_start_matches('#').trim();

    if title.starts_with("Title Page") {
        return SectionKind::TitlePage;
    }
    if title.starts_with("Closing Doha") {
        return SectionKind::ClosingDoha;
    }
    if let Some(rest) = title.strip_prefix("Opening Doha") {
        if let Some((n, _)) = leading_number(rest) {
            return SectionKind::OpeningDoha(n);
        }
    }
    if let Some(rest) = title.strip_prefix("Chapter") {
        if let Some((chapter, rest)) = leading_number(rest) {
            let verse = rest
                .strip_prefix(',')
                .map(str::trim_start)
                .and_then(|r| r.strip_prefix("Verse"))
                .and_then(verse_number);
            if let Some((verse, _)) = verse {
                return SectionKind::ChapterVerse(chapter, verse);
            }
        }
    }
    if let Some(rest) = title.strip_prefix("Verse") {
        if let Some((n, _)) = verse_number(rest) {
            return SectionKind::Verse(n);
        }
    }

    SectionKind::Other
}

/// Parse the decimal number at the start of `s` (after optional whitespace)
fn leading_number(s: &str) -> Option<(u32, &str)> {
    let s = s.trim_start();
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    Some((s[..end].parse().ok()?, &s[end..]))
}

/// A verse number must stand alone: `Verse 3:` or `Verse 3 Title`, never a
/// range like `Verse 1-3`
fn verse_number(s: &str) -> Option<(u32, &str)> {
    let (n, rest) = leading_number(s)?;
    match rest.chars().next() {
        None | Some(':') => Some((n, rest)),
        Some(c) if c.is_whitespace() => Some((n, rest)),
        Some(_) => None,
    }
}

fn scene_description(body: &[&str]) -> Option<String> {
    let (index, first) = body
        .iter()
        .enumerate()
        .find_map(|(i, line)| label_remainder(line).map(|rest| (i, rest)))?;

    let mut text = first.to_string();
    for line in &body[index + 1..] {
        text.push('\n');
        text.push_str(line);
    }

    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Text following a `Scene Description:` label on the same line.
/// Accepts `**Scene Description**:`, `**Scene Description:**` and the bare label.
fn label_remainder(line: &str) -> Option<&str> {
    let start = line.find(LABEL)?;
    let after = &line[start + LABEL.len()..];
    after
        .strip_prefix("**:")
        .or_else(|| after.strip_prefix(":**"))
        .or_else(|| after.strip_prefix(':'))
}
