use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use pagecap_lib::{
    CaptureError, CaptureTarget, Config, ExtractionMode, JobRequest, JobRunner, JobStore,
    LocatorKind, Viewport,
};

use crate::cli::OutputFormat;
use crate::settings::{apply_run_flags, RunFlagSources};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

#[allow(clippy::too_many_arguments)]
pub async fn run_capture(
    raw_args: &[String],
    config_path: Option<PathBuf>,
    url: String,
    targets_file: Option<PathBuf>,
    accordions: Vec<String>,
    selectors: Vec<String>,
    replay_titles: Vec<String>,
    out_dir: PathBuf,
    viewport: Viewport,
    target_width: u32,
    nav_timeout: u64,
    element_timeout: u64,
    chrome: Option<PathBuf>,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> ExitCode {
    let targets = match assemble_targets(targets_file.as_deref(), &accordions, &selectors, &replay_titles) {
        Ok(targets) => targets,
        Err(e) => return fail(&e),
    };
    if targets.is_empty() {
        return fail(&CaptureError::Config(
            "no capture targets: pass --targets FILE, or --accordion/--selector flags".to_string(),
        ));
    }

    let mut config = match Config::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => return fail(&e),
    };
    let flags = RunFlagSources::from_args(raw_args);
    apply_run_flags(
        &mut config,
        &flags,
        viewport,
        target_width,
        nav_timeout,
        element_timeout,
    );
    if let Some(path) = chrome {
        config.browser.executable = Some(path);
    }
    if let Err(e) = config.validate() {
        return fail(&e);
    }

    let store = JobStore::new();
    let runner = JobRunner::new(store.clone(), config);
    let id = runner.submit(JobRequest {
        url,
        targets,
        out_dir,
    });

    // The same polling contract a progress UI uses.
    let mut last_status = String::new();
    let record = loop {
        let view = store.status_view(&id);
        if view.status != last_status {
            eprintln!("{}", view.status);
            last_status = view.status.clone();
        }
        if view.done {
            break store.get(&id);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    };

    let Some(record) = record else {
        return fail(&CaptureError::Config("job record vanished".to_string()));
    };

    if let Err(e) = write_output(&record, format, output.as_deref()) {
        return fail(&e);
    }

    match &record.error {
        None => ExitCode::SUCCESS,
        Some(error) => {
            eprintln!("Job failed: {error}");
            ExitCode::FAILURE
        }
    }
}

fn assemble_targets(
    targets_file: Option<&std::path::Path>,
    accordions: &[String],
    selectors: &[String],
    replay_titles: &[String],
) -> pagecap_lib::Result<Vec<CaptureTarget>> {
    let mut targets = if let Some(path) = targets_file {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str::<Vec<CaptureTarget>>(&raw)?
    } else {
        let mut list = Vec::new();
        for title in accordions {
            list.push(CaptureTarget::accordion(title.clone(), title.clone()));
        }
        for spec in selectors {
            let (name, css) = spec.split_once('=').ok_or_else(|| {
                CaptureError::Config(format!("--selector expects NAME=CSS, got `{spec}`"))
            })?;
            list.push(CaptureTarget::selector(name.trim(), css.trim()));
        }
        list
    };

    for target in &mut targets {
        if target.kind == LocatorKind::Accordion
            && replay_titles.iter().any(|t| t.trim() == target.locator.trim())
        {
            target.mode = ExtractionMode::Replay;
        }
    }

    Ok(targets)
}

fn write_output(
    record: &pagecap_lib::JobRecord,
    format: OutputFormat,
    output: Option<&std::path::Path>,
) -> pagecap_lib::Result<()> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(record)?,
        OutputFormat::Text => render_text(record),
    };

    match output {
        Some(path) => {
            let mut file = std::fs::File::create(path)?;
            writeln!(file, "{rendered}")?;
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn render_text(record: &pagecap_lib::JobRecord) -> String {
    let mut lines = vec![format!("status: {}", record.status)];
    if let Some(error) = &record.error {
        lines.push(format!("error: {error}"));
    }
    if let Some(summary) = &record.summary {
        lines.push(format!(
            "captured {} target(s), {} failed",
            summary.captured, summary.failed
        ));
        for result in &summary.results {
            if result.ok {
                lines.push(format!(
                    "  ok   {} ({}) -> {}",
                    result.title,
                    result
                        .mode
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    result
                        .png_path
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default()
                ));
            } else {
                lines.push(format!(
                    "  fail {} ({})",
                    result.title,
                    result.error.as_deref().unwrap_or("unknown error")
                ));
            }
        }
    }
    lines.join("\n")
}

fn fail(error: &CaptureError) -> ExitCode {
    let payload = error.to_payload();
    eprintln!("Error: {}", payload.message);
    if let Some(remediation) = payload.remediation {
        eprintln!("Hint: {remediation}");
    }
    ExitCode::FAILURE
}
