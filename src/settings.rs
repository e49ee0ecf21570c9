use std::time::Duration;

use pagecap_lib::{Config, Viewport};

/// Tracks which CLI flags were explicitly provided vs. defaulted.
#[derive(Debug, Default)]
pub struct RunFlagSources {
    pub viewport: bool,
    pub target_width: bool,
    pub nav_timeout: bool,
    pub element_timeout: bool,
}

impl RunFlagSources {
    pub fn from_args(args: &[String]) -> Self {
        Self {
            viewport: flag_present(args, "--viewport"),
            target_width: flag_present(args, "--target-width"),
            nav_timeout: flag_present(args, "--nav-timeout"),
            element_timeout: flag_present(args, "--element-timeout"),
        }
    }
}

/// Checks if a flag was present in the command-line arguments.
pub fn flag_present(args: &[String], flag: &str) -> bool {
    args.iter()
        .any(|arg| arg == flag || arg.starts_with(&format!("{flag}=")))
}

/// Merge CLI arguments into the loaded config, preferring CLI values when
/// their flags were actually present.
pub fn apply_run_flags(
    config: &mut Config,
    flags: &RunFlagSources,
    cli_viewport: Viewport,
    cli_target_width: u32,
    cli_nav_timeout: u64,
    cli_element_timeout: u64,
) {
    if flags.viewport {
        config.viewport = cli_viewport;
    }
    if flags.target_width {
        config.render.target_width = cli_target_width;
    }
    if flags.nav_timeout {
        config.timeouts.navigation = Duration::from_secs(cli_nav_timeout);
    }
    if flags.element_timeout {
        config.timeouts.element_wait = Duration::from_secs(cli_element_timeout);
    }
}
