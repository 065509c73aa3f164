//! Terminal front end for a recompression run.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::core::{ProgressStatus, RunSummary};
use crate::processing::{RunConfig, RunController};
use crate::utils::extract_filename;
use crate::worker::{RunEvent, WorkerResult, spawn_run};

const PROGRESS_TEMPLATE: &str = "[{elapsed_precise}] ▕{bar:40.blue}▏{pos}/{len} {wide_msg}";

/// Recompresses everything under `config.root_directory` on a background worker.
///
/// When `show_progress` is set a progress bar is drawn on stderr and every
/// failed file is printed above it as it happens.
///
/// # Returns
/// The run summary, or the reason the run never started.
pub async fn compress_directory(config: RunConfig, show_progress: bool) -> WorkerResult<RunSummary> {
    debug!("Received compress command for {}", config.root_directory.display());

    let mut handle = spawn_run(RunController::new(config));
    let bar = if show_progress {
        new_progress_bar()
    } else {
        ProgressBar::hidden()
    };

    let mut failed = 0usize;
    while let Some(event) = handle.next_event().await {
        match event {
            RunEvent::Started { total } => bar.set_length(total as u64),
            RunEvent::Progress(progress) => {
                bar.set_position(progress.completed_tasks as u64);
                bar.set_message(extract_filename(&progress.path));
                if progress.status == ProgressStatus::Failed {
                    failed += 1;
                }
            }
            RunEvent::Failed(err) => bar.println(format!("✗ {err}")),
            RunEvent::Completed(summary) => {
                bar.finish_with_message(format!(
                    "done, {} failed",
                    summary.error_count
                ));
            }
        }
    }

    let summary = handle.wait().await?;
    debug_assert_eq!(failed, summary.error_count);
    Ok(summary)
}

fn new_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    let style = ProgressStyle::with_template(PROGRESS_TEMPLATE)
        .map(|style| style.progress_chars("█▓▒░  "))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}
