//! Preview rendering: turn an extracted fragment into html/png/jpg
//! artifacts.
//!
//! Each render builds a minimal standalone document around the fragment,
//! loads it in a fresh page of the shared browser session, waits for fonts
//! and images (best effort), shrinks the capture root to the target width,
//! resizes the virtual viewport to the scaled bounding box, and rasterizes
//! the root twice — lossless PNG and JPEG at a fixed quality — from the
//! same clip, at a fixed device pixel ratio.

use std::time::Duration;

use base64::Engine as _;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams, Viewport as ClipRegion,
};
use chromiumoxide::Page;
use image::GenericImageView;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::artifact::{safe_slug, ArtifactLayout, TargetPaths};
use crate::browser::{eval_json, poll_true, scripts, BrowserSession};
use crate::error::{CaptureError, Result};
use crate::extract::Fragment;
use crate::types::{ExtractionMode, FontTuning};

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Content wider than this is shrunk to fit; narrower content is left
    /// at natural size (never upscaled).
    pub target_width: u32,
    pub device_scale_factor: f64,
    pub jpeg_quality: i64,
    pub inline_asset_wait: Duration,
    pub replay_asset_wait: Duration,
    pub root_wait: Duration,
    pub settle: Duration,
    pub poll_interval: Duration,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            target_width: 1100,
            device_scale_factor: 2.0,
            jpeg_quality: 98,
            inline_asset_wait: Duration::from_secs(9),
            replay_asset_wait: Duration::from_secs(12),
            root_wait: Duration::from_secs(10),
            settle: Duration::from_millis(250),
            poll_interval: Duration::from_millis(150),
        }
    }
}

/// Written artifacts plus the raster geometry they were captured at.
#[derive(Debug, Clone)]
pub struct RenderArtifacts {
    pub paths: TargetPaths,
    pub scale: f64,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Deserialize)]
struct RootMeasure {
    width: f64,
    #[serde(rename = "baseFont")]
    base_font: f64,
}

#[derive(Debug, Deserialize)]
struct ScaledBox {
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
struct RootRect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

/// Shrink-only scale factor: `min(1.0, target / actual)`.
pub fn scale_to_width(actual_width: f64, target_width: f64) -> f64 {
    if actual_width <= 0.0 {
        return 1.0;
    }
    (target_width / actual_width).min(1.0)
}

/// Counteract the visual shrinkage of the transform for opted-in targets:
/// `clamp(base / scale, min, max)`.
pub fn corrected_font_px(base_px: f64, scale: f64, min_px: f64, max_px: f64) -> f64 {
    let scale = if scale > 0.0 { scale } else { 1.0 };
    (base_px / scale).clamp(min_px, max_px)
}

/// Assemble the standalone preview document for a fragment.
pub fn compose_document(fragment: &Fragment, base_href: &str, tuning: Option<&FontTuning>) -> String {
    match fragment {
        Fragment::Inline { html } => {
            let tuning_css = match tuning {
                Some(t) => format!(
                    "\n  #capture-root {{ --cap-base-font: {}; line-height: {} !important; }}",
                    t.base_px, t.line_height
                ),
                None => String::new(),
            };
            format!(
                r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<base href="{base_href}">
<style>
  html, body {{ margin:0; padding:0; background:#fff; }}
  #capture-root {{ line-height: 1.65; }}{tuning_css}
</style>
</head>
<body>
{html}
</body>
</html>"#
            )
        }
        Fragment::Replay {
            outer_html,
            manifest,
        } => {
            let links: String = manifest
                .links
                .iter()
                .map(|href| format!("<link rel=\"stylesheet\" href=\"{href}\">\n"))
                .collect();
            let styles: String = manifest
                .style_tags
                .iter()
                .map(|css| format!("<style>\n{css}\n</style>\n"))
                .collect();
            format!(
                r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<base href="{base_href}">
{links}{styles}<style>
  html, body {{ margin:0; padding:0; background:#fff; }}

  #capture-root {{
    background:#fff;
    margin:0;
    padding:24px;
    box-sizing:border-box;
    display:block;
  }}

  #capture-root {{
    font-size: 15px !important;
    line-height: 1.9 !important;
  }}

  #capture-root strong,
  #capture-root th {{
    font-weight: 600 !important;
    color: #222 !important;
  }}

  #capture-root p,
  #capture-root td {{
    color: #444 !important;
  }}

  #capture-root li {{
    margin-bottom: 10px !important;
  }}

  #capture-root ul {{
    padding-left: 18px !important;
  }}

  #capture-root, #capture-root * {{
    -webkit-font-smoothing: antialiased !important;
    text-rendering: geometricPrecision !important;
  }}
</style>
</head>
<body>
  <div id="capture-root">
    {outer_html}
  </div>
</body>
</html>"#
            )
        }
    }
}

pub struct PreviewRenderer {
    options: RenderOptions,
}

impl PreviewRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Render one fragment to its three artifacts. Hard failures (missing
    /// root, failed load) surface as `Render` errors; the preview page is
    /// closed on every path.
    pub async fn render(
        &self,
        session: &BrowserSession,
        layout: &ArtifactLayout,
        name: &str,
        fragment: &Fragment,
        base_href: &str,
        tuning: Option<&FontTuning>,
    ) -> Result<RenderArtifacts> {
        let slug = safe_slug(name);
        let paths = layout.paths_for(&slug);
        let document = compose_document(fragment, base_href, tuning);
        std::fs::write(&paths.html, &document)?;

        let file_url = Url::from_file_path(&paths.html).map_err(|_| {
            CaptureError::Render(format!("non-absolute artifact path: {}", paths.html.display()))
        })?;

        let page = session.new_preview_page().await?;
        let outcome = self
            .drive(&page, &file_url, fragment.mode(), tuning, paths)
            .await;
        if let Err(e) = page.close().await {
            debug!("failed to close preview page: {e}");
        }
        outcome
    }

    async fn drive(
        &self,
        page: &Page,
        file_url: &Url,
        mode: ExtractionMode,
        tuning: Option<&FontTuning>,
        paths: TargetPaths,
    ) -> Result<RenderArtifacts> {
        page.goto(file_url.as_str())
            .await
            .map_err(|e| CaptureError::Render(format!("preview document failed to load: {e}")))?;

        // Best effort; a page with a slow webfont still gets captured.
        let asset_wait = match mode {
            ExtractionMode::Inline => self.options.inline_asset_wait,
            ExtractionMode::Replay => self.options.replay_asset_wait,
        };
        if !poll_true(page, scripts::FONTS_LOADED, asset_wait, self.options.poll_interval).await {
            debug!("fonts still loading at capture time");
        }
        if !poll_true(page, scripts::IMAGES_COMPLETE, asset_wait, self.options.poll_interval).await
        {
            debug!("images still loading at capture time");
        }
        tokio::time::sleep(self.options.settle).await;

        if !poll_true(
            page,
            scripts::ROOT_PRESENT,
            self.options.root_wait,
            self.options.poll_interval,
        )
        .await
        {
            return Err(CaptureError::Render(
                "capture root never appeared in the preview document".to_string(),
            ));
        }

        let measured: Option<RootMeasure> = eval_json(page, scripts::MEASURE_ROOT).await?;
        let measured = measured.ok_or_else(|| {
            CaptureError::Render("capture root has no measurable width".to_string())
        })?;

        let scale = scale_to_width(measured.width, self.options.target_width as f64);
        let font_px = tuning.filter(|_| measured.base_font > 0.0).map(|t| {
            corrected_font_px(measured.base_font, scale, t.min_px, t.max_px)
        });

        let scaled: Option<ScaledBox> = eval_json(page, &scripts::apply_scale(scale, font_px)).await?;
        let scaled = scaled
            .ok_or_else(|| CaptureError::Render("capture root vanished while scaling".to_string()))?;
        tokio::time::sleep(self.options.settle).await;

        // Grow the virtual viewport to the scaled content so nothing clips.
        page.execute(SetDeviceMetricsOverrideParams::new(
            scaled.width.max(1) as i64,
            scaled.height.max(1) as i64,
            self.options.device_scale_factor,
            false,
        ))
        .await
        .map_err(|e| CaptureError::Render(format!("failed to resize viewport: {e}")))?;

        let rect: Option<RootRect> = eval_json(page, scripts::ROOT_RECT).await?;
        let rect = rect
            .ok_or_else(|| CaptureError::Render("capture root vanished before capture".to_string()))?;

        let png = self
            .capture(page, &rect, CaptureScreenshotFormat::Png, None)
            .await?;
        let jpg = self
            .capture(
                page,
                &rect,
                CaptureScreenshotFormat::Jpeg,
                Some(self.options.jpeg_quality),
            )
            .await?;

        std::fs::write(&paths.png, &png)?;
        std::fs::write(&paths.jpg, &jpg)?;

        let (png_w, png_h) = image::load_from_memory(&png)?.dimensions();
        let (jpg_w, jpg_h) = image::load_from_memory(&jpg)?.dimensions();
        if (png_w, png_h) != (jpg_w, jpg_h) {
            warn!(
                png = %format!("{png_w}x{png_h}"),
                jpg = %format!("{jpg_w}x{jpg_h}"),
                "lossless and compressed captures disagree on size"
            );
        }
        debug!(
            artifact = %paths.png.display(),
            size = %format!("{png_w}x{png_h}"),
            scale,
            "captured preview"
        );

        Ok(RenderArtifacts {
            paths,
            scale,
            width: png_w,
            height: png_h,
        })
    }

    /// Rasterize the clip once. PNG and JPEG captures use the same clip, so
    /// both artifacts reference an identical bounding box.
    async fn capture(
        &self,
        page: &Page,
        rect: &RootRect,
        format: CaptureScreenshotFormat,
        quality: Option<i64>,
    ) -> Result<Vec<u8>> {
        let mut builder = CaptureScreenshotParams::builder()
            .format(format)
            .capture_beyond_viewport(true)
            .clip(ClipRegion {
                x: rect.x,
                y: rect.y,
                width: rect.width.max(1.0),
                height: rect.height.max(1.0),
                scale: 1.0,
            });
        if let Some(q) = quality {
            builder = builder.quality(q);
        }

        let response = page
            .execute(builder.build())
            .await
            .map_err(|e| CaptureError::Render(format!("screenshot failed: {e}")))?;
        let raw: &str = response.data.as_ref();
        base64::engine::general_purpose::STANDARD
            .decode(raw.as_bytes())
            .map_err(|e| CaptureError::Render(format!("screenshot payload was not base64: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::StyleManifest;

    #[test]
    fn scale_never_exceeds_one() {
        assert!(scale_to_width(2200.0, 1100.0) <= 1.0);
        assert!((scale_to_width(2200.0, 1100.0) - 0.5).abs() < f64::EPSILON);
        assert!((scale_to_width(400.0, 1100.0) - 1.0).abs() < f64::EPSILON);
        assert!((scale_to_width(1100.0, 1100.0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn scale_handles_degenerate_widths() {
        assert!((scale_to_width(0.0, 1100.0) - 1.0).abs() < f64::EPSILON);
        assert!((scale_to_width(-5.0, 1100.0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn corrected_font_clamps_to_bounds() {
        // base 11 at scale 1.0 -> 11, clamped up to the 12px floor
        assert!((corrected_font_px(11.0, 1.0, 12.0, 16.0) - 12.0).abs() < f64::EPSILON);
        // base 11 at scale 0.5 -> 22, clamped down to the 16px ceiling
        assert!((corrected_font_px(11.0, 0.5, 12.0, 16.0) - 16.0).abs() < f64::EPSILON);
        // in-range values pass through
        assert!((corrected_font_px(11.0, 0.8, 12.0, 16.0) - 13.75).abs() < 1e-9);
        // zero scale treated as no scaling
        assert!((corrected_font_px(11.0, 0.0, 12.0, 16.0) - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn inline_document_embeds_base_href_and_reset() {
        let fragment = Fragment::Inline {
            html: "<div id=\"capture-root\"><p>hi</p></div>".to_string(),
        };
        let doc = compose_document(&fragment, "https://example.com/goods/X1", None);

        assert!(doc.contains("<base href=\"https://example.com/goods/X1\">"));
        assert!(doc.contains("line-height: 1.65"));
        assert!(doc.contains("capture-root"));
        assert!(!doc.contains("--cap-base-font"));
    }

    #[test]
    fn inline_document_adds_font_tuning_when_opted_in() {
        let fragment = Fragment::Inline {
            html: "<div id=\"capture-root\"></div>".to_string(),
        };
        let doc = compose_document(
            &fragment,
            "https://example.com/",
            Some(&FontTuning::default()),
        );

        assert!(doc.contains("--cap-base-font: 11"));
        assert!(doc.contains("line-height: 1.55 !important"));
    }

    #[test]
    fn replay_document_references_original_stylesheets() {
        let fragment = Fragment::Replay {
            outer_html: "<table><tr><th>k</th><td>v</td></tr></table>".to_string(),
            manifest: StyleManifest {
                style_tags: vec![".x { color: blue; }".to_string()],
                links: vec!["https://example.com/site.css".to_string()],
                base_href: "https://example.com/goods/X1".to_string(),
            },
        };
        let doc = compose_document(&fragment, "https://example.com/goods/X1", None);

        assert!(doc.contains("<link rel=\"stylesheet\" href=\"https://example.com/site.css\">"));
        assert!(doc.contains(".x { color: blue; }"));
        assert!(doc.contains("font-size: 15px !important"));
        assert!(doc.contains("<div id=\"capture-root\">"));
    }

    #[test]
    fn render_options_default_values() {
        let opts = RenderOptions::default();
        assert_eq!(opts.target_width, 1100);
        assert_eq!(opts.jpeg_quality, 98);
        assert!((opts.device_scale_factor - 2.0).abs() < f64::EPSILON);
        assert!(opts.replay_asset_wait > opts.inline_asset_wait);
    }
}
