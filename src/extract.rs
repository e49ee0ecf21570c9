//! Snapshot extraction: freeze a live subtree so it can be rendered later,
//! independent of the source page.
//!
//! Two strategies sit behind one entry point so the technique can be
//! swapped without touching callers. Inline mode flattens the cascade by
//! copying every computed style onto the clone; replay mode keeps the raw
//! markup and captures the page's stylesheet set once, preserving
//! cascade-dependent layout for targets that inline flattening distorts.

use chromiumoxide::Page;
use serde::Deserialize;
use tracing::debug;

use crate::browser::{eval_json, scripts, Located};
use crate::error::{CaptureError, Result};
use crate::types::ExtractionMode;

/// Page-wide stylesheet snapshot backing replay-mode documents.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleManifest {
    pub style_tags: Vec<String>,
    pub links: Vec<String>,
    pub base_href: String,
}

/// A frozen fragment ready for preview rendering.
#[derive(Debug, Clone)]
pub enum Fragment {
    /// Computed styles inlined; self-contained markup.
    Inline { html: String },
    /// Raw markup that still needs the original stylesheets.
    Replay {
        outer_html: String,
        manifest: StyleManifest,
    },
}

impl Fragment {
    pub fn mode(&self) -> ExtractionMode {
        match self {
            Fragment::Inline { .. } => ExtractionMode::Inline,
            Fragment::Replay { .. } => ExtractionMode::Replay,
        }
    }
}

/// Extract `located` with the requested mode. The style manifest is
/// collected at most once per page and reused across replay targets.
pub async fn extract(
    page: &Page,
    located: &Located,
    mode: ExtractionMode,
    manifest: &mut Option<StyleManifest>,
) -> Result<Fragment> {
    match mode {
        ExtractionMode::Inline => {
            let html = inline_snapshot(page, located).await?;
            Ok(Fragment::Inline { html })
        }
        ExtractionMode::Replay => {
            if manifest.is_none() {
                *manifest = Some(style_manifest(page).await?);
            }
            let outer_html = raw_outer_html(page, located).await?;
            Ok(Fragment::Replay {
                outer_html,
                manifest: manifest
                    .clone()
                    .ok_or_else(|| CaptureError::extraction("style manifest unavailable"))?,
            })
        }
    }
}

/// Clone + computed-style inlining; returns the capture-root wrapper HTML.
pub async fn inline_snapshot(page: &Page, located: &Located) -> Result<String> {
    let script = scripts::inline_snapshot(located.frame_path(), located.mark());
    let html: Option<String> = eval_json(page, &script)
        .await
        .map_err(|e| CaptureError::Extraction(format!("{}: {e}", located.description())))?;

    match html {
        Some(html) if !html.trim().is_empty() => {
            debug!(target = located.description(), bytes = html.len(), "inline snapshot extracted");
            Ok(html)
        }
        _ => Err(CaptureError::Extraction(format!(
            "inline snapshot of {} came back empty",
            located.description()
        ))),
    }
}

/// Raw outer markup of the target, unmodified.
pub async fn raw_outer_html(page: &Page, located: &Located) -> Result<String> {
    let script = scripts::outer_html(located.frame_path(), located.mark());
    let html: Option<String> = eval_json(page, &script)
        .await
        .map_err(|e| CaptureError::Extraction(format!("{}: {e}", located.description())))?;

    match html {
        Some(html) if !html.trim().is_empty() => Ok(html),
        _ => Err(CaptureError::Extraction(format!(
            "outer HTML of {} came back empty",
            located.description()
        ))),
    }
}

/// Collect inline `<style>` contents, stylesheet link URLs and the page's
/// resolved base URL.
pub async fn style_manifest(page: &Page) -> Result<StyleManifest> {
    let manifest: StyleManifest = eval_json(page, scripts::STYLE_MANIFEST)
        .await
        .map_err(|e| CaptureError::Extraction(format!("stylesheet snapshot failed: {e}")))?;
    debug!(
        styles = manifest.style_tags.len(),
        links = manifest.links.len(),
        "collected page style manifest"
    );
    Ok(manifest)
}

/// Resolved URL of the source page, used as the preview base href.
pub async fn resolved_base_href(page: &Page, fallback: &str) -> String {
    eval_json::<String>(page, scripts::BASE_HREF)
        .await
        .unwrap_or_else(|_| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_reports_its_mode() {
        let inline = Fragment::Inline {
            html: "<div id=\"capture-root\"></div>".to_string(),
        };
        assert_eq!(inline.mode(), ExtractionMode::Inline);

        let replay = Fragment::Replay {
            outer_html: "<div></div>".to_string(),
            manifest: StyleManifest {
                style_tags: vec![],
                links: vec![],
                base_href: "https://example.com/p/1".to_string(),
            },
        };
        assert_eq!(replay.mode(), ExtractionMode::Replay);
    }

    #[test]
    fn style_manifest_deserializes_from_page_payload() {
        let raw = r#"{
            "styleTags": [".a { color: red; }"],
            "links": ["https://example.com/site.css"],
            "baseHref": "https://example.com/goods/X1"
        }"#;
        let manifest: StyleManifest = serde_json::from_str(raw).expect("parse manifest");
        assert_eq!(manifest.style_tags.len(), 1);
        assert_eq!(manifest.links[0], "https://example.com/site.css");
        assert_eq!(manifest.base_href, "https://example.com/goods/X1");
    }
}
