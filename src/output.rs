//! External output schemas: what pollers and result consumers see.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::CaptureResult;

/// The polling view, read e.g. every 500ms by a progress UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusView {
    pub status: String,
    pub done: bool,
    pub error: Option<String>,
}

/// Job-level result summary: per-target outcomes plus the render
/// directories artifacts were written into.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub url: String,
    pub captured: usize,
    pub failed: usize,
    pub html_dir: PathBuf,
    pub png_dir: PathBuf,
    pub jpg_dir: PathBuf,
    pub results: Vec<CaptureResult>,
}

impl JobSummary {
    pub fn from_results(
        url: impl Into<String>,
        html_dir: PathBuf,
        png_dir: PathBuf,
        jpg_dir: PathBuf,
        results: Vec<CaptureResult>,
    ) -> Self {
        let captured = results.iter().filter(|r| r.ok).count();
        let failed = results.len() - captured;
        Self {
            url: url.into(),
            captured,
            failed,
            html_dir,
            png_dir,
            jpg_dir,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExtractionMode;

    #[test]
    fn summary_counts_partial_success() {
        let summary = JobSummary::from_results(
            "https://example.com/goods/X1",
            "out/renders/html".into(),
            "out/renders/png".into(),
            "out/renders/jpg".into(),
            vec![
                CaptureResult::success(
                    "A",
                    ExtractionMode::Inline,
                    "a.html".into(),
                    "a.png".into(),
                    "a.jpg".into(),
                ),
                CaptureResult::failure("B", "selector not found: div.b"),
            ],
        );

        assert_eq!(summary.captured, 1);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn status_view_serializes_null_error() {
        let view = JobStatusView {
            status: "Capturing A".to_string(),
            done: false,
            error: None,
        };
        let json = serde_json::to_value(&view).expect("serialize");
        assert_eq!(json["status"], "Capturing A");
        assert_eq!(json["done"], false);
        assert!(json["error"].is_null());
    }
}
