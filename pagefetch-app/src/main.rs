use clap::Parser;
use cli::Cli;
use pagefetch_common::FetchError;
use pagefetch_common::observability::{LogConfig, init_logging};
use pagefetch_config::PageFetchConfigLoader;
use pagefetch_drivers::chrome::ChromeLauncher;
use pagefetch_web::{Fetcher, validate_url};
use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

mod cli;
mod report;

const EXIT_FAILURE: u8 = 1;
const EXIT_INVALID_INPUT: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(LogConfig {
        emit_stderr: cli.verbose,
        ..LogConfig::default()
    }) {
        if let Some(notice) = report::logging_notice(&e, cli.verbose) {
            eprintln!("{notice}");
        }
    }

    if let Err(e) = validate_url(&cli.url) {
        eprintln!("error: {e}");
        return ExitCode::from(EXIT_INVALID_INPUT);
    }

    let mut config = match PageFetchConfigLoader::discover(cli.config.as_deref()).load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: config: {e}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };
    cli.apply_overrides(&mut config);

    let request = cli.to_request(&config);
    let fetcher = Fetcher::new(ChromeLauncher::from_config(&config))
        .with_poll_interval(Duration::from_millis(config.poll_interval_ms));

    match fetcher.fetch(&request).await {
        Ok(output) => {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = stdout.write_all(report::render(&request, &output).as_bytes()) {
                tracing::warn!(error = %e, "failed to write report");
                return ExitCode::from(EXIT_FAILURE);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            match e {
                FetchError::InvalidInput(_) => ExitCode::from(EXIT_INVALID_INPUT),
                FetchError::SessionStart(_) | FetchError::Navigation(_) => {
                    ExitCode::from(EXIT_FAILURE)
                }
            }
        }
    }
}
