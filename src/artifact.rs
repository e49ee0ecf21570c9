//! Artifact naming and on-disk layout.
//!
//! Every job writes into three parallel directories under
//! `<out>/renders/{html,png,jpg}`, one file per target, named by a
//! filesystem-safe slug of the target name.

use std::path::{Path, PathBuf};

use crate::error::Result;

const MAX_SLUG_CHARS: usize = 120;
const FALLBACK_SLUG: &str = "file";

/// Derive a filesystem-safe slug from a human-readable target name.
///
/// Whitespace runs collapse to a single underscore; everything that is not
/// alphanumeric, `-` or `_` is stripped; letters are lowercased; the result
/// is truncated to 120 characters and falls back to `"file"` when nothing
/// survives.
pub fn safe_slug(name: &str) -> String {
    let joined = name.trim().split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned: String = joined
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .flat_map(char::to_lowercase)
        .take(MAX_SLUG_CHARS)
        .collect();

    if cleaned.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        cleaned
    }
}

/// Paths of the three artifacts produced for one target.
#[derive(Debug, Clone)]
pub struct TargetPaths {
    pub html: PathBuf,
    pub png: PathBuf,
    pub jpg: PathBuf,
}

/// The per-job render directories.
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    pub html_dir: PathBuf,
    pub png_dir: PathBuf,
    pub jpg_dir: PathBuf,
}

impl ArtifactLayout {
    /// Create `<out>/renders/{html,png,jpg}`.
    pub fn create(out_dir: &Path) -> Result<Self> {
        let renders = out_dir.join("renders");
        let layout = Self {
            html_dir: renders.join("html"),
            png_dir: renders.join("png"),
            jpg_dir: renders.join("jpg"),
        };
        std::fs::create_dir_all(&layout.html_dir)?;
        std::fs::create_dir_all(&layout.png_dir)?;
        std::fs::create_dir_all(&layout.jpg_dir)?;
        Ok(layout)
    }

    pub fn paths_for(&self, slug: &str) -> TargetPaths {
        TargetPaths {
            html: self.html_dir.join(format!("{slug}.html")),
            png: self.png_dir.join(format!("{slug}.png")),
            jpg: self.jpg_dir.join(format!("{slug}.jpg")),
        }
    }
}
