//! Per-job capture orchestration.
//!
//! `submit` registers a job and returns immediately; one worker task drives
//! the whole job: launch a browser session, navigate the source page, walk
//! the targets strictly in order, record one result each, and close the
//! session on every exit path. Per-target failures are recorded and skipped
//! — partial success is a first-class outcome. Failures outside the
//! per-target scope (session launch, source navigation) terminate the job
//! with a job-level error. Concurrent jobs are bounded by semaphore
//! permits; a queued job holds its `queued` status until a permit frees up.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{error, warn};

use crate::artifact::ArtifactLayout;
use crate::browser::{
    BrowserSession, DisclosureController, ElementLocator, LocatorTimeouts, SessionOptions,
};
use crate::config::Config;
use crate::error::{CaptureError, Result};
use crate::extract::{self, StyleManifest};
use crate::job::{JobId, JobStore};
use crate::output::JobSummary;
use crate::render::{PreviewRenderer, RenderOptions};
use crate::types::{CaptureResult, CaptureTarget, LocatorKind};

/// Everything needed to run one capture job.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub url: String,
    pub targets: Vec<CaptureTarget>,
    pub out_dir: PathBuf,
}

#[derive(Clone)]
pub struct JobRunner {
    store: JobStore,
    config: Arc<Config>,
    permits: Arc<Semaphore>,
}

impl JobRunner {
    pub fn new(store: JobStore, config: Config) -> Self {
        let permits = config.jobs.max_concurrent.max(1);
        Self {
            store,
            config: Arc::new(config),
            permits: Arc::new(Semaphore::new(permits)),
        }
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Accept a job: register it and spawn its worker. Returns immediately;
    /// callers poll the store until `done`.
    pub fn submit(&self, request: JobRequest) -> JobId {
        let id = self.store.create();
        let store = self.store.clone();
        let config = self.config.clone();
        let permits = self.permits.clone();
        let job_id = id.clone();

        tokio::spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    store.finish_error(&job_id, "job queue is shut down");
                    return;
                }
            };

            match run_job(&store, &job_id, &config, &request).await {
                Ok(summary) => store.finish_success(&job_id, summary),
                Err(e) => {
                    error!(job = %job_id, "job failed: {e}");
                    store.finish_error(&job_id, e.to_string());
                }
            }
        });

        id
    }
}

async fn run_job(
    store: &JobStore,
    id: &JobId,
    config: &Config,
    request: &JobRequest,
) -> Result<JobSummary> {
    if request.targets.is_empty() {
        return Err(CaptureError::Config(
            "no capture targets supplied".to_string(),
        ));
    }

    store.set_status(id, "Launching headless browser.");
    // Launch before touching the output directory: a job that cannot get a
    // session must not leave partial artifacts behind.
    let session = BrowserSession::launch(session_options(config)).await?;

    let layout = match ArtifactLayout::create(&request.out_dir) {
        Ok(layout) => layout,
        Err(e) => {
            session.close().await;
            return Err(e);
        }
    };

    let outcome = drive_targets(store, id, config, request, &session, &layout).await;
    session.close().await;
    let results = outcome?;

    Ok(JobSummary::from_results(
        request.url.clone(),
        layout.html_dir,
        layout.png_dir,
        layout.jpg_dir,
        results,
    ))
}

async fn drive_targets(
    store: &JobStore,
    id: &JobId,
    config: &Config,
    request: &JobRequest,
    session: &BrowserSession,
    layout: &ArtifactLayout,
) -> Result<Vec<CaptureResult>> {
    store.set_status(id, format!("Loading page: {}", request.url));
    session.navigate(&request.url).await?;

    let locator = ElementLocator::new(session.source().clone(), locator_timeouts(config));
    let disclosure = DisclosureController::new(
        locator.clone(),
        config.disclosure.clone(),
        config.timeouts.element_wait,
        config.timeouts.pane_visibility,
    );
    let renderer = PreviewRenderer::new(render_options(config));
    let base_href = extract::resolved_base_href(session.source(), &request.url).await;

    let mut manifest: Option<StyleManifest> = None;
    let mut results = Vec::with_capacity(request.targets.len());

    for target in &request.targets {
        store.set_status(id, format!("Capturing {}.", target.name));
        let captured = capture_target(
            session,
            &locator,
            &disclosure,
            &renderer,
            layout,
            &base_href,
            &mut manifest,
            target,
        )
        .await;

        match captured {
            Ok(result) => results.push(result),
            Err(e) => {
                warn!(target = %target.name, "capture failed: {e}");
                results.push(CaptureResult::failure(&target.name, e.to_string()));
            }
        }
    }

    Ok(results)
}

#[allow(clippy::too_many_arguments)]
async fn capture_target(
    session: &BrowserSession,
    locator: &ElementLocator,
    disclosure: &DisclosureController,
    renderer: &PreviewRenderer,
    layout: &ArtifactLayout,
    base_href: &str,
    manifest: &mut Option<StyleManifest>,
    target: &CaptureTarget,
) -> Result<CaptureResult> {
    let located = match target.kind {
        LocatorKind::Accordion => disclosure.open(&target.locator).await?.pane,
        LocatorKind::Selector => {
            let located = locator.locate(&target.locator).await?;
            locator.scroll_into_view(&located).await;
            located
        }
    };

    let fragment = extract::extract(session.source(), &located, target.mode, manifest).await?;
    let artifacts = renderer
        .render(
            session,
            layout,
            &target.name,
            &fragment,
            base_href,
            target.font_tuning.as_ref(),
        )
        .await?;

    Ok(CaptureResult::success(
        &target.name,
        fragment.mode(),
        artifacts.paths.html,
        artifacts.paths.png,
        artifacts.paths.jpg,
    ))
}

fn session_options(config: &Config) -> SessionOptions {
    SessionOptions {
        viewport: config.viewport,
        device_scale_factor: config.render.device_scale_factor,
        headless: config.browser.headless,
        executable: config.browser.executable.clone(),
        request_timeout: config.browser.request_timeout,
        navigation_settle: config.timeouts.navigation_settle,
        extra_args: config.browser.extra_args.clone(),
    }
}

fn locator_timeouts(config: &Config) -> LocatorTimeouts {
    LocatorTimeouts {
        element_wait: config.timeouts.element_wait,
        frame_wait: config.timeouts.frame_wait,
        activation_settle: config.timeouts.activation_settle,
        ..LocatorTimeouts::default()
    }
}

fn render_options(config: &Config) -> RenderOptions {
    RenderOptions {
        target_width: config.render.target_width,
        device_scale_factor: config.render.device_scale_factor,
        jpeg_quality: config.render.jpeg_quality,
        inline_asset_wait: config.timeouts.inline_asset_wait,
        replay_asset_wait: config.timeouts.replay_asset_wait,
        root_wait: config.timeouts.root_wait,
        settle: config.timeouts.render_settle,
        ..RenderOptions::default()
    }
}
