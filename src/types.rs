//! Core data types for capture targets and their per-target outcomes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How a capture target is located on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocatorKind {
    /// `locator` is the visible title text of a disclosure widget.
    Accordion,
    /// `locator` is a CSS selector.
    Selector,
}

/// Extraction strategy for a target.
///
/// Inline flattens the cascade into per-node inline styles; replay keeps the
/// raw markup and re-references the page's original stylesheets, which
/// preserves cascade-dependent layout (overlapping positioned elements) at
/// the cost of depending on those stylesheets staying reachable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    #[default]
    Inline,
    Replay,
}

impl std::fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionMode::Inline => write!(f, "inline"),
            ExtractionMode::Replay => write!(f, "replay"),
        }
    }
}

/// Opt-in font correction for a target whose content shrinks under the
/// scale-to-width transform.
///
/// The preview root gets `base_px` as a CSS custom property; after scaling,
/// the applied size is `clamp(base_px / scale, min_px, max_px)`. The numeric
/// defaults are an empirical tuning carried over from the validated
/// rendering; change them only against reference output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FontTuning {
    pub base_px: f64,
    pub min_px: f64,
    pub max_px: f64,
    pub line_height: f64,
}

impl Default for FontTuning {
    fn default() -> Self {
        Self {
            base_px: 11.0,
            min_px: 12.0,
            max_px: 16.0,
            line_height: 1.55,
        }
    }
}

/// One thing to capture: a name (drives artifact filenames), a locator, and
/// an extraction mode. Immutable, supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureTarget {
    pub name: String,
    pub locator: String,
    pub kind: LocatorKind,
    #[serde(default)]
    pub mode: ExtractionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_tuning: Option<FontTuning>,
}

impl CaptureTarget {
    pub fn accordion(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locator: title.into(),
            kind: LocatorKind::Accordion,
            mode: ExtractionMode::Inline,
            font_tuning: None,
        }
    }

    pub fn selector(name: impl Into<String>, css: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locator: css.into(),
            kind: LocatorKind::Selector,
            mode: ExtractionMode::Inline,
            font_tuning: None,
        }
    }

    pub fn with_mode(mut self, mode: ExtractionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_font_tuning(mut self, tuning: FontTuning) -> Self {
        self.font_tuning = Some(tuning);
        self
    }
}

/// Per-target outcome. Failures are local: a failed target is recorded and
/// the job moves on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResult {
    pub ok: bool,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ExtractionMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub png_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jpg_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CaptureResult {
    pub fn success(
        title: impl Into<String>,
        mode: ExtractionMode,
        html_path: PathBuf,
        png_path: PathBuf,
        jpg_path: PathBuf,
    ) -> Self {
        Self {
            ok: true,
            title: title.into(),
            mode: Some(mode),
            html_path: Some(html_path),
            png_path: Some(png_path),
            jpg_path: Some(jpg_path),
            error: None,
        }
    }

    pub fn failure(title: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            title: title.into(),
            mode: None,
            html_path: None,
            png_path: None,
            jpg_path: None,
            error: Some(error.into()),
        }
    }
}
