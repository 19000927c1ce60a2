//! Output identifiers

use crate::error::{Result, VerseError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The file name of one generated illustration, e.g. `chapter-02-verse-07.png`.
///
/// An `OutputId` is also the key of the output directory: the illustration
/// lives at `<images>/<theme>/<id>`.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputId(String);

impl OutputId {
    pub const TITLE_PAGE: &'static str = "title-page.png";
    pub const CLOSING_DOHA: &'static str = "closing-doha.png";

    pub fn title_page() -> Self {
        Self(Self::TITLE_PAGE.to_string())
    }

    pub fn opening_doha(number: u32) -> Self {
        Self(format!("opening-doha-{:02}.png", number))
    }

    pub fn chapter_verse(chapter: u32, verse: u32) -> Self {
        Self(format!("chapter-{:02}-verse-{:02}.png", chapter, verse))
    }

    pub fn verse(number: u32) -> Self {
        Self(format!("verse-{:02}.png", number))
    }

    pub fn closing_doha() -> Self {
        Self(Self::CLOSING_DOHA.to_string())
    }

    /// Validate user input (e.g. from `--start-from` or `--regenerate`).
    ///
    /// Only plain file names are accepted so an id can never address a path
    /// outside the theme directory.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s == "." || s == ".." || s.contains(|c: char| c == '/' || c == '\\') {
            return Err(VerseError::InvalidOutputId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this id belongs to a chapter-verse document
    pub fn is_chapter_verse(&self) -> bool {
        self.0.starts_with("chapter-")
    }

    /// The `(chapter, verse)` pair of a `chapter-CC-verse-VV.png` id
    pub fn chapter_verse_numbers(&self) -> Option<(u32, u32)> {
        let rest = self.0.strip_prefix("chapter-")?;
        let (chapter, rest) = rest.split_once("-verse-")?;
        let verse = rest.strip_suffix(".png")?;
        Some((chapter.parse().ok()?, verse.parse().ok()?))
    }
}

impl fmt::Debug for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutputId({})", self.0)
    }
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<std::path::Path> for OutputId {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}
