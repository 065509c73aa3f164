use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::core::{Progress, ProgressReporter, ProgressStatus, RunState, RunSummary};
use crate::processing::{ErrorSink, FileScanner, Recompressor};
use crate::utils::{CompressorError, CompressorResult, extract_filename};
use super::config::{LogMode, RunConfig};
use super::metrics::RunMetrics;

/// Drives a run: scan once, then recompress every file in scan order.
///
/// A failing file is logged, counted and reported; it never stops the run.
/// Only an invalid configuration, a missing root or an empty scan prevent a
/// run from starting.
pub struct RunController {
    config: RunConfig,
    recompressor: Recompressor,
    cancel: Arc<AtomicBool>,
}

impl RunController {
    pub fn new(config: RunConfig) -> Self {
        let recompressor = Recompressor::new(config.gif_optimizer.clone());
        Self {
            config,
            recompressor,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shares an existing cancellation flag with this controller.
    pub fn with_cancellation(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Flag checked between files; setting it ends the run after the current file.
    pub fn cancellation_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Validates the configuration and scans the root.
    ///
    /// Fails with [`CompressorError::EmptyDirectory`] when nothing matched.
    pub fn prepare(&self) -> CompressorResult<RunState> {
        self.config.validate()?;

        let root = &self.config.root_directory;
        let files = FileScanner::scan(&self.config.scan_request())?;
        if files.is_empty() {
            info!("No images found in {}", root.display());
            return Err(CompressorError::empty_directory(root));
        }

        debug!("Prepared run over {} files in {}", files.len(), root.display());
        Ok(RunState::new(root, files))
    }

    /// Processes every remaining file of `state`, reporting as it goes.
    pub fn execute<R>(&self, state: &mut RunState, reporter: &mut R) -> RunSummary
    where
        R: ProgressReporter + ?Sized,
    {
        let total = state.total();
        let quality = self.config.quality;
        let root = state.root().to_path_buf();

        info!(
            "Recompressing {} files in {} at quality {}",
            total,
            root.display(),
            quality.value()
        );

        let mut sink = match self.config.log_mode {
            LogMode::Incremental => ErrorSink::incremental(&root),
            LogMode::AtEnd => ErrorSink::new(),
        };
        let mut metrics = RunMetrics::start();
        let mut cancelled = false;

        while let Some(path) = state.current_file().map(Path::to_path_buf) {
            if self.cancel.load(Ordering::Relaxed) {
                info!("Run cancelled after {}/{} files", state.processed(), total);
                cancelled = true;
                break;
            }

            let started = Instant::now();
            let progress = match self.recompressor.recompress(&path, quality) {
                Ok(outcome) => {
                    state.complete_current(&outcome);
                    Progress::new(state.processed(), total, &path, outcome.status.into())
                        .with_saved_bytes(outcome.saved_bytes())
                }
                Err(err) => {
                    warn!("Recompression failed for {}: {}", err.path.display(), err.message);
                    reporter.report_error(&err);
                    sink.record_error(err);
                    state.fail_current();
                    Progress::new(state.processed(), total, &path, ProgressStatus::Failed)
                }
            };
            metrics.record_file(started.elapsed());

            debug!(
                "[{}/{}] {} {:?}",
                progress.completed_tasks,
                total,
                extract_filename(&path),
                progress.status
            );
            reporter.report_progress(&progress);
        }

        debug_assert_eq!(state.error_count(), sink.count());

        let error_log = if state.error_count() > 0 {
            persist_errors(&mut sink, &root)
        } else {
            None
        };

        let mut summary = state.summary();
        summary.elapsed_ms = metrics.elapsed().as_millis() as u64;
        summary.error_log = error_log;
        summary.cancelled = cancelled;

        metrics.log_summary();
        if summary.error_count > 0 {
            warn!(
                "Run completed with {} failed files out of {}",
                summary.error_count, summary.processed
            );
        } else {
            info!("Run completed successfully: {} files processed", summary.processed);
        }

        reporter.report_complete(&summary);
        summary
    }

    /// Scans and processes in one go.
    pub fn run<R>(&self, reporter: &mut R) -> CompressorResult<RunSummary>
    where
        R: ProgressReporter + ?Sized,
    {
        let mut state = self.prepare()?;
        Ok(self.execute(&mut state, reporter))
    }
}

/// Makes sure every failure is on disk; flush problems are logged, never fatal.
fn persist_errors(sink: &mut ErrorSink, root: &Path) -> Option<PathBuf> {
    if sink.is_persisted() {
        return sink.log_path().map(Path::to_path_buf);
    }

    match sink.flush(root) {
        Ok(path) => Some(path),
        Err(e) => {
            error!("Failed to write error log in {}: {}", root.display(), e);
            None
        }
    }
}
