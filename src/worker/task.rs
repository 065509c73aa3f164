use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::core::{Progress, ProgressReporter, RunSummary};
use crate::processing::RunController;
use crate::utils::{CompressorResult, RecompressError};
use super::error::WorkerResult;

/// Notification sent from a background run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RunEvent {
    /// Scan finished, processing is about to begin
    Started { total: usize },
    Progress(Progress),
    Failed(RecompressError),
    Completed(RunSummary),
}

struct ChannelReporter {
    tx: UnboundedSender<RunEvent>,
}

impl ChannelReporter {
    fn send(&self, event: RunEvent) {
        // A dropped receiver only means nobody is listening any more
        let _ = self.tx.send(event);
    }
}

impl ProgressReporter for ChannelReporter {
    fn report_progress(&mut self, progress: &Progress) {
        self.send(RunEvent::Progress(progress.clone()));
    }

    fn report_error(&mut self, error: &RecompressError) {
        self.send(RunEvent::Failed(error.clone()));
    }

    fn report_complete(&mut self, summary: &RunSummary) {
        self.send(RunEvent::Completed(summary.clone()));
    }
}

/// Handle to a run executing on the blocking pool.
pub struct RunHandle {
    events: UnboundedReceiver<RunEvent>,
    cancel: Arc<AtomicBool>,
    task: JoinHandle<CompressorResult<RunSummary>>,
}

impl RunHandle {
    /// Next event, or `None` once the run has finished and all events were read.
    pub async fn next_event(&mut self) -> Option<RunEvent> {
        self.events.recv().await
    }

    /// Asks the run to stop before its next file.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Waits for the run to finish, discarding unread events.
    pub async fn wait(self) -> WorkerResult<RunSummary> {
        let summary = self.task.await??;
        Ok(summary)
    }
}

/// Starts `controller` on tokio's blocking pool.
///
/// Must be called from within a tokio runtime.
pub fn spawn_run(controller: RunController) -> RunHandle {
    let (tx, events) = mpsc::unbounded_channel();
    let cancel = controller.cancellation_flag();

    let task = tokio::task::spawn_blocking(move || -> CompressorResult<RunSummary> {
        let mut reporter = ChannelReporter { tx };
        let mut state = controller.prepare()?;
        debug!("Background run starting with {} files", state.total());
        reporter.send(RunEvent::Started { total: state.total() });
        Ok(controller.execute(&mut state, &mut reporter))
    });

    RunHandle { events, cancel, task }
}
