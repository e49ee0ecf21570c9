//! Pagecap Library
//!
//! Captures rendered fragments of dynamic, script-driven web pages as
//! reproducible raster snapshots. Content hidden behind disclosure widgets
//! (accordions) or nested in iframes/shadow trees is located, frozen
//! independently of the live page, and rasterized at a fixed device pixel
//! ratio. One browser session is launched per job and reused for every
//! target in it.
//!
//! # Module Overview
//!
//! - [`browser`] - session lifecycle, element discovery, disclosure control
//! - [`extract`] - style-freezing and stylesheet-preserving extraction
//! - [`render`] - standalone preview documents and scaled screenshots
//! - [`job`] - in-memory job registry polled by consumers
//! - [`orchestrator`] - per-job worker: browser lifecycle + result assembly
//! - [`config`] - configuration file support
//! - [`types`] - capture targets and per-target results
//! - [`output`] - JSON output schemas
//!
//! # Example
//!
//! ```no_run
//! use pagecap_lib::{CaptureTarget, Config, JobRequest, JobRunner, JobStore};
//!
//! # async fn example() {
//! let store = JobStore::new();
//! let runner = JobRunner::new(store.clone(), Config::default());
//!
//! let id = runner.submit(JobRequest {
//!     url: "https://example.com/goods/X1".to_string(),
//!     targets: vec![CaptureTarget::accordion("A", "Accordion Title X")],
//!     out_dir: "out".into(),
//! });
//!
//! // Poll until the worker finishes; partial target failures are recorded
//! // in the summary, not raised.
//! while !store.status_view(&id).done {
//!     tokio::time::sleep(std::time::Duration::from_millis(500)).await;
//! }
//! # }
//! ```

pub mod artifact;
pub mod browser;
pub mod config;
pub mod error;
pub mod extract;
pub mod job;
pub mod orchestrator;
pub mod output;
pub mod render;
pub mod types;
pub mod viewport;

pub use artifact::{safe_slug, ArtifactLayout, TargetPaths};
pub use browser::{
    ActivationStrategy, BrowserSession, DisclosureController, DisclosureSelectors,
    DisclosureWidget, ElementLocator, Located, LocatorTimeouts, SearchContext, SessionOptions,
};
pub use config::{BrowserSettings, Config, JobSettings, RenderConfig, Timeouts};
pub use error::{CaptureError, ErrorCategory, ErrorPayload, Result};
pub use extract::{Fragment, StyleManifest};
pub use job::{JobId, JobRecord, JobStore};
pub use orchestrator::{JobRequest, JobRunner};
pub use output::{JobStatusView, JobSummary};
pub use render::{
    compose_document, corrected_font_px, scale_to_width, PreviewRenderer, RenderArtifacts,
    RenderOptions,
};
pub use types::{CaptureResult, CaptureTarget, ExtractionMode, FontTuning, LocatorKind};
pub use viewport::Viewport;
