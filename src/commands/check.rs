use std::path::PathBuf;
use std::process::ExitCode;

use pagecap_lib::{BrowserSession, Config, SessionOptions};

/// Launch and immediately close a browser session to verify the machine can
/// run captures.
pub async fn run_check(config: Config, chrome: Option<PathBuf>) -> ExitCode {
    let options = SessionOptions {
        viewport: config.viewport,
        device_scale_factor: config.render.device_scale_factor,
        headless: config.browser.headless,
        executable: chrome.or(config.browser.executable),
        request_timeout: config.browser.request_timeout,
        navigation_settle: config.timeouts.navigation_settle,
        extra_args: config.browser.extra_args,
    };

    match BrowserSession::launch(options).await {
        Ok(session) => {
            session.close().await;
            println!("Browser launch OK.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            let payload = e.to_payload();
            eprintln!("Browser launch failed: {}", payload.message);
            if let Some(remediation) = payload.remediation {
                eprintln!("Hint: {remediation}");
            }
            ExitCode::FAILURE
        }
    }
}
