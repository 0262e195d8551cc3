//! Font resolution.
//!
//! Maps a logical font name from config (`"Roboto"`) to a TrueType file in a
//! fixed local directory. Fonts are never downloaded: if nothing matches, the
//! caller gets [`FontError::NotFound`] and renders a diagnostic string
//! instead of the title.
//!
//! Candidate file names, first existing file wins:
//!
//! ```text
//! {Name}-Bold.ttf
//! {Name}.ttf
//! {name}-bold.ttf
//! {name}.ttf
//! ```

use rusttype::Font;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FontError {
    #[error("font '{name}' not found in {dir}")]
    NotFound { name: String, dir: PathBuf },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("font file {0} is not a valid TrueType font")]
    Invalid(PathBuf),
}

/// Looks up fonts in a single directory.
#[derive(Debug, Clone)]
pub struct FontResolver {
    dir: PathBuf,
}

impl FontResolver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Find the file for `name`, probing the naming conventions in order.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        candidate_file_names(name)
            .into_iter()
            .map(|file| self.dir.join(file))
            .find(|path| path.is_file())
    }

    /// Resolve and parse the font.
    pub fn load(&self, name: &str) -> Result<Font<'static>, FontError> {
        let path = self.resolve(name).ok_or_else(|| FontError::NotFound {
            name: name.to_string(),
            dir: self.dir.clone(),
        })?;
        let bytes = std::fs::read(&path)?;
        Font::try_from_vec(bytes).ok_or(FontError::Invalid(path))
    }
}

/// File names tried for a logical font name, in priority order.
pub fn candidate_file_names(name: &str) -> [String; 4] {
    let name = name.trim();
    let lower = name.to_lowercase();
    [
        format!("{name}-Bold.ttf"),
        format!("{name}.ttf"),
        format!("{lower}-bold.ttf"),
        format!("{lower}.ttf"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn candidate_order() {
        assert_eq!(
            candidate_file_names("Roboto"),
            [
                "Roboto-Bold.ttf".to_string(),
                "Roboto.ttf".to_string(),
                "roboto-bold.ttf".to_string(),
                "roboto.ttf".to_string(),
            ]
        );
    }

    #[test]
    fn resolve_prefers_bold() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("Roboto.ttf"), b"x").unwrap();
        std::fs::write(tmp.path().join("Roboto-Bold.ttf"), b"x").unwrap();

        let resolver = FontResolver::new(tmp.path());
        assert_eq!(
            resolver.resolve("Roboto"),
            Some(tmp.path().join("Roboto-Bold.ttf"))
        );
    }

    #[test]
    fn resolve_falls_back_to_lowercase() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("lato.ttf"), b"x").unwrap();

        let resolver = FontResolver::new(tmp.path());
        assert_eq!(resolver.resolve("Lato"), Some(tmp.path().join("lato.ttf")));
    }

    #[test]
    fn resolve_missing_is_none() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(FontResolver::new(tmp.path()).resolve("Nope"), None);
    }

    #[test]
    fn resolve_ignores_directories() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("Roboto.ttf")).unwrap();
        assert_eq!(FontResolver::new(tmp.path()).resolve("Roboto"), None);
    }

    #[test]
    fn load_missing_reports_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = FontResolver::new(tmp.path()).load("Roboto").unwrap_err();
        assert!(matches!(err, FontError::NotFound { ref name, .. } if name == "Roboto"));
    }

    #[test]
    fn load_garbage_reports_invalid() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("Broken.ttf"), b"not a font").unwrap();
        let err = FontResolver::new(tmp.path()).load("Broken").unwrap_err();
        assert!(matches!(err, FontError::Invalid(_)));
    }
}
