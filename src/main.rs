// Command-line entry point. The library (lib.rs) holds everything else.

mod cli;

use std::process::ExitCode;
use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use image_compressor_lib::{CompressorError, RunSummary, WorkerError, compress_directory};
use crate::cli::Cli;

const EXIT_FAILURE: u8 = 1;
const EXIT_EMPTY_DIRECTORY: u8 = 2;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)         // Remove file path
        .with_line_number(false)  // Remove line numbers
        .with_thread_ids(false)   // Remove thread IDs
        .with_thread_names(false) // Remove thread names
        .with_target(false)       // Remove module path
        .with_ansi(true)          // Keep colored output
        .with_writer(std::io::stderr) // stdout is reserved for --json
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli).await {
        Ok(summary) => {
            print_summary(&summary, cli.json);
            ExitCode::SUCCESS
        }
        Err(err) => {
            let code = match err.downcast_ref::<WorkerError>() {
                Some(WorkerError::Run(CompressorError::EmptyDirectory(dir))) => {
                    warn!("No images to compress in {}", dir.display());
                    EXIT_EMPTY_DIRECTORY
                }
                _ => {
                    error!("{:#}", err);
                    EXIT_FAILURE
                }
            };
            ExitCode::from(code)
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<RunSummary> {
    let config = cli.to_config().context("Invalid arguments")?;
    info!(
        "=== Compressing {} (quality {}) ===",
        config.root_directory.display(),
        config.quality.value()
    );

    let summary = compress_directory(config, !cli.json).await?;
    Ok(summary)
}

fn print_summary(summary: &RunSummary, json: bool) {
    if json {
        match serde_json::to_string_pretty(summary) {
            Ok(out) => println!("{out}"),
            Err(e) => error!("Failed to serialize summary: {}", e),
        }
        return;
    }

    info!(
        "Processed {}/{} files: {} recompressed, {} unchanged, {} failed, {} bytes saved in {:.1}s",
        summary.processed,
        summary.total_files,
        summary.recompressed,
        summary.unchanged,
        summary.error_count,
        summary.saved_bytes,
        summary.elapsed_ms as f64 / 1000.0
    );
    if let Some(log) = &summary.error_log {
        warn!("Failures were written to {}", log.display());
    }
}
