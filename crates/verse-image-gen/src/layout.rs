//! Project directory layout
//!
//! ```text
//! <root>/
//!   docs/image-prompts.md      scene descriptions
//!   docs/themes/<theme>.yml    theme profiles
//!   images/<theme>/<id>        generated illustrations
//!   .verse/config.toml         tool configuration
//! ```

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn docs_dir(&self) -> PathBuf {
        self.root.join("docs")
    }

    pub fn prompts_file(&self) -> PathBuf {
        self.docs_dir().join("image-prompts.md")
    }

    pub fn themes_dir(&self) -> PathBuf {
        self.docs_dir().join("themes")
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join("images")
    }

    /// Where the illustrations of `theme` are written
    pub fn theme_dir(&self, theme: &str) -> PathBuf {
        self.images_dir().join(theme)
    }
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self::new(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let layout = ProjectLayout::new("/srv/chalisa");
        assert_eq!(
            layout.prompts_file(),
            PathBuf::from("/srv/chalisa/docs/image-prompts.md")
        );
        assert_eq!(layout.themes_dir(), PathBuf::from("/srv/chalisa/docs/themes"));
        assert_eq!(
            layout.theme_dir("watercolor"),
            PathBuf::from("/srv/chalisa/images/watercolor")
        );
    }
}
