//! Persistence of finished artifacts.
//!
//! The generator hands every finished image to an [`ArtifactStore`]. The
//! provided [`DirectoryStore`] writes it to `{slug}.{ext}` in an output
//! directory, next to a `{slug}.json` sidecar:
//!
//! ```json
//! {
//!   "title": "Gatos Raros",
//!   "alt": "Gatos Raros",
//!   "file": "gatos-raros.jpg",
//!   "source_url": "https://example.com/cat.jpg",
//!   "sha256": "9f86d08…",
//!   "created": "2026-10-18 09:12:44"
//! }
//! ```
//!
//! The slug comes from [`slugify`]; an existing image with the same slug is
//! what the CLI treats as "this item already has a featured image".

use chrono::Local;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extensions a stored artifact can have.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

const FALLBACK_SLUG: &str = "featured-image";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported extension: {0}")]
    Extension(String),
}

/// Final image ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    /// Lowercase, without the dot.
    pub extension: String,
    /// Display title, also used as alt text.
    pub title: String,
    /// Where the image came from; `None` for fallback cards.
    pub source_url: Option<String>,
}

/// Sidecar metadata written next to each artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub title: String,
    pub alt: String,
    pub file: String,
    pub source_url: Option<String>,
    pub sha256: String,
    pub created: String,
}

/// Where an artifact ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub path: PathBuf,
    pub record: ArtifactRecord,
}

pub trait ArtifactStore {
    fn store(&mut self, artifact: &Artifact) -> Result<StoredArtifact, StoreError>;
}

/// Writes artifacts into one directory.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    dir: PathBuf,
}

impl DirectoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Existing image for `title`, if any.
    pub fn existing(&self, title: &str) -> Option<PathBuf> {
        let slug = slugify(title);
        IMAGE_EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{slug}.{ext}")))
            .find(|path| path.is_file())
    }
}

impl ArtifactStore for DirectoryStore {
    fn store(&mut self, artifact: &Artifact) -> Result<StoredArtifact, StoreError> {
        let ext = artifact.extension.to_lowercase();
        if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            return Err(StoreError::Extension(artifact.extension.clone()));
        }
        fs::create_dir_all(&self.dir)?;

        let slug = slugify(&artifact.title);
        let file = format!("{slug}.{ext}");
        let path = self.dir.join(&file);

        fs::write(&path, &artifact.bytes)?;

        // Only once the new image is on disk, drop the previous one stored
        // under another extension
        for old in IMAGE_EXTENSIONS.iter().filter(|e| **e != ext) {
            let stale = self.dir.join(format!("{slug}.{old}"));
            if stale.is_file() {
                fs::remove_file(&stale)?;
            }
        }

        let record = ArtifactRecord {
            title: artifact.title.clone(),
            alt: artifact.title.clone(),
            file,
            source_url: artifact.source_url.clone(),
            sha256: format!("{:x}", Sha256::digest(&artifact.bytes)),
            created: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        };
        fs::write(
            self.dir.join(format!("{slug}.json")),
            serde_json::to_string_pretty(&record)?,
        )?;

        Ok(StoredArtifact { path, record })
    }
}

/// File-name-safe slug of a title.
///
/// Lowercase ASCII letters and digits are kept, common Latin accents are
/// folded, runs of anything else become a single dash.
///
/// - `"Gatos Raros"` → `"gatos-raros"`
/// - `"¿Qué pasó en 2024?"` → `"que-paso-en-2024"`
/// - `"!!!"` → `"featured-image"`
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        let folded = match c {
            'a'..='z' | '0'..='9' => Some(c),
            'á' | 'à' | 'ä' | 'â' | 'ã' | 'å' => Some('a'),
            'é' | 'è' | 'ë' | 'ê' => Some('e'),
            'í' | 'ì' | 'ï' | 'î' => Some('i'),
            'ó' | 'ò' | 'ö' | 'ô' | 'õ' => Some('o'),
            'ú' | 'ù' | 'ü' | 'û' => Some('u'),
            'ñ' => Some('n'),
            'ç' => Some('c'),
            _ => None,
        };
        match folded {
            Some(c) => {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push(c);
            }
            None => pending_dash = true,
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}
