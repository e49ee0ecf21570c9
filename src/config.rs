//! Configuration for capture jobs.
//!
//! Defaults mirror the tuning the capture pipeline was validated with:
//! a 1400x900 source viewport at device pixel ratio 2, snapshots scaled
//! down to 1100px, and JPEG quality 98. All values can be overridden via
//! a TOML file (explicit `--config` path, then `~/.config/pagecap/config.toml`)
//! and individual CLI flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::browser::DisclosureSelectors;
use crate::error::{CaptureError, Result};
use crate::Viewport;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub viewport: Viewport,
    pub render: RenderConfig,
    pub timeouts: Timeouts,
    pub disclosure: DisclosureSelectors,
    pub browser: BrowserSettings,
    pub jobs: JobSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Captured content is shrunk (never enlarged) to fit this width.
    pub target_width: u32,
    pub device_scale_factor: f64,
    pub jpeg_quality: i64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            target_width: 1100,
            device_scale_factor: 2.0,
            jpeg_quality: 98,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Source page navigation.
    #[serde(with = "humantime_serde")]
    pub navigation: Duration,
    /// Top-document element search budget.
    #[serde(with = "humantime_serde")]
    pub element_wait: Duration,
    /// Per-frame budget during the iframe scan.
    #[serde(with = "humantime_serde")]
    pub frame_wait: Duration,
    /// Wait for a disclosure pane to become visible after activation.
    #[serde(with = "humantime_serde")]
    pub pane_visibility: Duration,
    /// Font/image readiness in an inline-mode preview.
    #[serde(with = "humantime_serde")]
    pub inline_asset_wait: Duration,
    /// Font/image readiness in a replay-mode preview (external stylesheets).
    #[serde(with = "humantime_serde")]
    pub replay_asset_wait: Duration,
    /// Wait for the capture root to appear in a preview document.
    #[serde(with = "humantime_serde")]
    pub root_wait: Duration,
    /// Pause between an activation attempt and its success probe.
    #[serde(with = "humantime_serde")]
    pub activation_settle: Duration,
    /// Pause after source-page navigation before touching the DOM.
    #[serde(with = "humantime_serde")]
    pub navigation_settle: Duration,
    /// Pause after scaling before the screenshot is taken.
    #[serde(with = "humantime_serde")]
    pub render_settle: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation: Duration::from_secs(30),
            element_wait: Duration::from_secs(10),
            frame_wait: Duration::from_secs(2),
            pane_visibility: Duration::from_secs(10),
            inline_asset_wait: Duration::from_secs(9),
            replay_asset_wait: Duration::from_secs(12),
            root_wait: Duration::from_secs(10),
            activation_settle: Duration::from_millis(150),
            navigation_settle: Duration::from_millis(900),
            render_settle: Duration::from_millis(250),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    /// Explicit Chrome/Chromium executable; auto-detected when unset.
    pub executable: Option<PathBuf>,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Additional command-line switches for the browser process.
    pub extra_args: Vec<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            request_timeout: Duration::from_secs(30),
            extra_args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSettings {
    /// Browser sessions running at once; further jobs queue for a permit.
    pub max_concurrent: usize,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self { max_concurrent: 1 }
    }
}

impl Config {
    /// Load config from a TOML file, the central config, or defaults.
    /// Priority: explicit path > ~/.config/pagecap/config.toml > defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let chosen = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::central_config_path().filter(|p| p.exists()),
        };

        let Some(file) = chosen else {
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(&file)?;
        toml::from_str(&raw)
            .map_err(|e| CaptureError::Config(format!("Invalid config {}: {}", file.display(), e)))
    }

    pub fn central_config_path() -> Option<PathBuf> {
        if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(dir).join("pagecap").join("config.toml"));
        }
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".config").join("pagecap").join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.render.target_width == 0 {
            return Err(CaptureError::Config(
                "render.target_width must be positive".to_string(),
            ));
        }
        if self.render.device_scale_factor <= 0.0 {
            return Err(CaptureError::Config(
                "render.device_scale_factor must be positive".to_string(),
            ));
        }
        if !(1..=100).contains(&self.render.jpeg_quality) {
            return Err(CaptureError::Config(
                "render.jpeg_quality must be in 1..=100".to_string(),
            ));
        }
        if self.jobs.max_concurrent == 0 {
            return Err(CaptureError::Config(
                "jobs.max_concurrent must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_match_expected() {
        let cfg = Config::default();

        assert_eq!(cfg.viewport.width, 1400);
        assert_eq!(cfg.viewport.height, 900);
        assert_eq!(cfg.render.target_width, 1100);
        assert!((cfg.render.device_scale_factor - 2.0).abs() < f64::EPSILON);
        assert_eq!(cfg.render.jpeg_quality, 98);
        assert_eq!(cfg.timeouts.navigation, Duration::from_secs(30));
        assert_eq!(cfg.timeouts.element_wait, Duration::from_secs(10));
        assert_eq!(cfg.timeouts.frame_wait, Duration::from_secs(2));
        assert_eq!(cfg.timeouts.navigation_settle, Duration::from_millis(900));
        assert!(cfg.browser.headless);
        assert!(cfg.browser.executable.is_none());
        assert_eq!(cfg.jobs.max_concurrent, 1);
        cfg.validate().expect("defaults must validate");
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let cfg: Config = toml::from_str(
            r#"
            [render]
            target_width = 800

            [timeouts]
            element_wait = "4s"

            [browser]
            headless = false
            "#,
        )
        .expect("parse config");

        assert_eq!(cfg.render.target_width, 800);
        assert_eq!(cfg.render.jpeg_quality, 98);
        assert_eq!(cfg.timeouts.element_wait, Duration::from_secs(4));
        assert_eq!(cfg.timeouts.navigation, Duration::from_secs(30));
        assert!(!cfg.browser.headless);
    }

    #[test]
    fn validate_rejects_zero_target_width() {
        let mut cfg = Config::default();
        cfg.render.target_width = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_jpeg_quality() {
        let mut cfg = Config::default();
        cfg.render.jpeg_quality = 0;
        assert!(cfg.validate().is_err());
        cfg.render.jpeg_quality = 101;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_fails_for_missing_explicit_path() {
        let err = Config::load(Some(Path::new("/definitely/missing/pagecap.toml")));
        assert!(err.is_err(), "explicit missing path must be an error");
    }
}
