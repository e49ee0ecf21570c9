//! Headless browser coordination: session lifecycle, element discovery and
//! disclosure-widget control.

pub mod disclosure;
pub mod locator;
pub(crate) mod scripts;
pub mod session;

pub use disclosure::{DisclosureController, DisclosureSelectors, DisclosureWidget};
pub use locator::{ActivationStrategy, ElementLocator, Located, LocatorTimeouts, SearchContext};
pub use session::{BrowserSession, SessionOptions};

use std::time::Duration;

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{CaptureError, Result};

/// Evaluate a script expected to return a boolean; evaluation failures and
/// non-boolean results count as `false`.
pub(crate) async fn eval_bool(page: &Page, script: &str) -> bool {
    match page.evaluate(script.to_string()).await {
        Ok(result) => result.into_value::<bool>().unwrap_or(false),
        Err(e) => {
            debug!("script evaluation failed: {e}");
            false
        }
    }
}

/// Evaluate a script and deserialize its JSON result.
pub(crate) async fn eval_json<T: DeserializeOwned>(page: &Page, script: &str) -> Result<T> {
    let result = page
        .evaluate(script.to_string())
        .await
        .map_err(|e| CaptureError::Render(format!("script evaluation failed: {e}")))?;
    result
        .into_value::<T>()
        .map_err(|e| CaptureError::Render(format!("unexpected script result: {e}")))
}

/// Re-evaluate a boolean script until it holds or the deadline passes.
pub(crate) async fn poll_true(
    page: &Page,
    script: &str,
    timeout: Duration,
    interval: Duration,
) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if eval_bool(page, script).await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(interval).await;
    }
}
