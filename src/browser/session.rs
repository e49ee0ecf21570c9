//! Browser session owned by one capture job.
//!
//! A session holds one headless Chromium process and one long-lived
//! "source" page used for navigation and element discovery. Preview
//! rendering opens its own short-lived pages against the same session so
//! it never contaminates the source page's DOM. The session is used from a
//! single task; the orchestrator guarantees `close` on every job exit path.

use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{CaptureError, Result};
use crate::Viewport;

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub viewport: Viewport,
    pub device_scale_factor: f64,
    pub headless: bool,
    pub executable: Option<PathBuf>,
    pub request_timeout: Duration,
    /// Pause after source navigation before the DOM is touched.
    pub navigation_settle: Duration,
    /// Additional command-line switches for the browser process.
    pub extra_args: Vec<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            device_scale_factor: 2.0,
            headless: true,
            executable: None,
            request_timeout: Duration::from_secs(30),
            navigation_settle: Duration::from_millis(900),
            extra_args: Vec::new(),
        }
    }
}

pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    source: Page,
    options: SessionOptions,
}

impl BrowserSession {
    /// Launch the browser and open the source page.
    pub async fn launch(options: SessionOptions) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(options.viewport.width, options.viewport.height)
            .request_timeout(options.request_timeout)
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--hide-scrollbars")
            .arg("--mute-audio");

        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &options.executable {
            builder = builder.chrome_executable(path);
        }
        for arg in &options.extra_args {
            builder = builder.arg(arg);
        }

        let config = builder
            .build()
            .map_err(|e| CaptureError::Session(format!("invalid browser config: {e}")))?;

        info!(
            viewport = %options.viewport,
            headless = options.headless,
            "launching headless browser"
        );
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| CaptureError::Session(format!("failed to launch browser: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("browser handler: {e}");
                }
            }
        });

        let session = Self {
            source: Self::open_page(&browser, &options).await?,
            browser,
            handler_task,
            options,
        };
        Ok(session)
    }

    async fn open_page(browser: &Browser, options: &SessionOptions) -> Result<Page> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| CaptureError::Session(format!("failed to open page: {e}")))?;

        page.execute(SetDeviceMetricsOverrideParams::new(
            options.viewport.width as i64,
            options.viewport.height as i64,
            options.device_scale_factor,
            false,
        ))
        .await
        .map_err(|e| CaptureError::Session(format!("failed to set device metrics: {e}")))?;

        Ok(page)
    }

    /// The long-lived page element discovery runs against.
    pub fn source(&self) -> &Page {
        &self.source
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Navigate the source page and let the document settle.
    pub async fn navigate(&self, url: &str) -> Result<()> {
        info!(url, "loading source page");
        self.source
            .goto(url)
            .await
            .map_err(|e| CaptureError::Render(format!("failed to load {url}: {e}")))?;
        // Script-rendered pages keep mutating after the load event.
        tokio::time::sleep(self.options.navigation_settle).await;
        Ok(())
    }

    /// Open an isolated page for preview rendering. Callers close it.
    pub async fn new_preview_page(&self) -> Result<Page> {
        Self::open_page(&self.browser, &self.options).await
    }

    /// Close the browser. Safe to call exactly once on every exit path.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("failed to close browser: {e}");
        }
        if let Err(e) = self.browser.wait().await {
            debug!("browser wait: {e}");
        }
        self.handler_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_options_default_values() {
        let opts = SessionOptions::default();
        assert!(opts.headless);
        assert!(opts.executable.is_none());
        assert_eq!(opts.viewport.width, 1400);
        assert_eq!(opts.viewport.height, 900);
        assert!((opts.device_scale_factor - 2.0).abs() < f64::EPSILON);
        assert_eq!(opts.navigation_settle, Duration::from_millis(900));
        assert!(opts.extra_args.is_empty());
    }

    #[tokio::test]
    async fn launch_fails_for_missing_executable() {
        let result = BrowserSession::launch(SessionOptions {
            executable: Some(PathBuf::from("/definitely/not/a/browser")),
            ..SessionOptions::default()
        })
        .await;

        match result {
            Err(CaptureError::Session(_)) => {}
            other => panic!("expected session error, got {:?}", other.map(|_| ())),
        }
    }
}
