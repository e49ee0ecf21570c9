use clap::{Parser, Subcommand, ValueEnum};
use pagecap_lib::Viewport;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pagecap")]
#[command(
    version,
    about = "Pagecap - capture rendered fragments of script-driven pages as raster snapshots",
    long_about = "Pagecap\n\nModes:\n- run: capture a list of targets (accordion sections and CSS-selected blocks) from one page into html/png/jpg artifacts.\n- check: verify a headless Chromium can be launched on this machine.\n\nUse --help on any subcommand for details."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Optional config file (TOML) to set defaults for viewport/render/timeouts; CLI flags override config"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Capture targets from a page into html/png/jpg artifacts
    Run {
        #[arg(long, help = "Page URL to capture from")]
        url: String,

        #[arg(
            long,
            value_name = "PATH",
            help = "JSON file with the ordered capture target list ([{name, locator, kind, mode?, fontTuning?}])"
        )]
        targets: Option<PathBuf>,

        #[arg(
            long,
            value_name = "TITLE",
            help = "Capture the accordion section with this visible title (repeatable; name defaults to the title)"
        )]
        accordion: Vec<String>,

        #[arg(
            long,
            value_name = "NAME=CSS",
            help = "Capture the first element matching a CSS selector (repeatable)"
        )]
        selector: Vec<String>,

        #[arg(
            long,
            value_name = "TITLE",
            help = "Accordion titles to save in replay mode (original stylesheets instead of inlined computed styles)"
        )]
        replay: Vec<String>,

        #[arg(long, short, default_value = "out", help = "Output directory")]
        out: PathBuf,

        #[arg(
            long,
            default_value = "1400x900",
            help = "Source viewport dimensions (WIDTHxHEIGHT)"
        )]
        viewport: Viewport,

        #[arg(
            long,
            default_value = "1100",
            help = "Captured content wider than this is shrunk to fit (never upscaled)"
        )]
        target_width: u32,

        #[arg(
            long,
            default_value = "30",
            help = "Navigation timeout (seconds) for the source page"
        )]
        nav_timeout: u64,

        #[arg(
            long,
            default_value = "10",
            help = "Element/disclosure search timeout (seconds) in the top document"
        )]
        element_timeout: u64,

        #[arg(long, value_name = "PATH", help = "Chrome/Chromium executable to use")]
        chrome: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "text", help = "Output format")]
        format: OutputFormat,

        #[arg(long, short = 'O', help = "Write the job summary to this file (stdout if omitted)")]
        output: Option<PathBuf>,
    },

    /// Verify a headless browser can be launched
    Check {
        #[arg(long, value_name = "PATH", help = "Chrome/Chromium executable to use")]
        chrome: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

pub fn parse() -> Cli {
    Cli::parse()
}
