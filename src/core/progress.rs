use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use crate::core::{OutcomeStatus, RunSummary};
use crate::utils::RecompressError;

/// How the file behind a progress update ended
#[derive(Debug, Deserialize, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ProgressStatus {
    Recompressed,
    Unchanged,
    Failed,
}

impl From<OutcomeStatus> for ProgressStatus {
    fn from(status: OutcomeStatus) -> Self {
        match status {
            OutcomeStatus::Recompressed => Self::Recompressed,
            OutcomeStatus::Unchanged => Self::Unchanged,
        }
    }
}

/// Progress after one file of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Number of completed files, counting from 1
    pub completed_tasks: usize,
    /// Total number of files in the run
    pub total_tasks: usize,
    /// Progress percentage (0-100)
    pub progress_percentage: usize,
    /// File this update refers to
    pub path: PathBuf,
    pub status: ProgressStatus,
    /// Bytes saved on this file, zero on failure
    #[serde(default)]
    pub saved_bytes: i64,
}

impl Progress {
    /// Create a new Progress instance with basic information
    pub fn new(
        completed_tasks: usize,
        total_tasks: usize,
        path: impl Into<PathBuf>,
        status: ProgressStatus,
    ) -> Self {
        let progress_percentage = if total_tasks > 0 {
            (completed_tasks * 100) / total_tasks
        } else {
            0
        };

        Self {
            completed_tasks,
            total_tasks,
            progress_percentage,
            path: path.into(),
            status,
            saved_bytes: 0,
        }
    }

    pub fn with_saved_bytes(mut self, saved_bytes: i64) -> Self {
        self.saved_bytes = saved_bytes;
        self
    }
}

/// Receives notifications from a run as they happen.
///
/// All methods are called inline on the thread driving the run.
pub trait ProgressReporter {
    /// Called once after every file, whatever its outcome.
    fn report_progress(&mut self, progress: &Progress);

    /// Called for each failed file, before its progress update.
    fn report_error(&mut self, _error: &RecompressError) {}

    /// Called once when the run ends.
    fn report_complete(&mut self, summary: &RunSummary);
}

/// Reporter that ignores everything.
impl ProgressReporter for () {
    fn report_progress(&mut self, _progress: &Progress) {}
    fn report_complete(&mut self, _summary: &RunSummary) {}
}

/// Adapts two plain callbacks to [`ProgressReporter`].
///
/// `on_progress` receives `(processed, total)` after every file and
/// `on_complete` receives `(processed, error_count)` once at the end.
pub struct CallbackReporter<P, C> {
    on_progress: P,
    on_complete: C,
}

impl<P, C> CallbackReporter<P, C>
where
    P: FnMut(usize, usize),
    C: FnMut(usize, usize),
{
    pub fn new(on_progress: P, on_complete: C) -> Self {
        Self { on_progress, on_complete }
    }
}

impl<P, C> ProgressReporter for CallbackReporter<P, C>
where
    P: FnMut(usize, usize),
    C: FnMut(usize, usize),
{
    fn report_progress(&mut self, progress: &Progress) {
        (self.on_progress)(progress.completed_tasks, progress.total_tasks);
    }

    fn report_complete(&mut self, summary: &RunSummary) {
        (self.on_complete)(summary.processed, summary.error_count);
    }
}
