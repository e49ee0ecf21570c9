mod cli;
mod commands;
mod settings;

use std::process::ExitCode;

use cli::Commands;
use commands::{run_capture, run_check};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let raw_args: Vec<String> = std::env::args().collect();
    let args = cli::parse();

    init_tracing(args.verbose);

    match args.command {
        Commands::Run {
            url,
            targets,
            accordion,
            selector,
            replay,
            out,
            viewport,
            target_width,
            nav_timeout,
            element_timeout,
            chrome,
            format,
            output,
        } => {
            run_capture(
                &raw_args,
                args.config,
                url,
                targets,
                accordion,
                selector,
                replay,
                out,
                viewport,
                target_width,
                nav_timeout,
                element_timeout,
                chrome,
                format,
                output,
            )
            .await
        }
        Commands::Check { chrome } => {
            let config = match pagecap_lib::Config::load(args.config.as_deref()) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Error: {e}");
                    return ExitCode::FAILURE;
                }
            };
            run_check(config, chrome).await
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "pagecap=debug,pagecap_lib=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
