//! Per-run state owned by the caller.

use std::path::{Path, PathBuf};
use crate::core::{OutcomeStatus, RecompressOutcome, RunSummary};

/// Mutable state of one run.
///
/// Created once the scan has produced the file list; the index and counters
/// only ever move forward. There is no resume: a new run starts from a new
/// scan.
#[derive(Debug, Clone)]
pub struct RunState {
    root: PathBuf,
    files: Vec<PathBuf>,
    current_index: usize,
    error_count: usize,
    recompressed: usize,
    unchanged: usize,
    original_bytes: u64,
    final_bytes: u64,
}

impl RunState {
    pub fn new(root: impl Into<PathBuf>, files: Vec<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files,
            current_index: 0,
            error_count: 0,
            recompressed: 0,
            unchanged: 0,
            original_bytes: 0,
            final_bytes: 0,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn total(&self) -> usize {
        self.files.len()
    }

    /// Number of files attempted so far
    pub fn processed(&self) -> usize {
        self.current_index
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn is_finished(&self) -> bool {
        self.current_index >= self.files.len()
    }

    /// Next file to process, if any
    pub fn current_file(&self) -> Option<&Path> {
        self.files.get(self.current_index).map(PathBuf::as_path)
    }

    /// Marks the current file as done and tallies its outcome.
    pub fn complete_current(&mut self, outcome: &RecompressOutcome) {
        match outcome.status {
            OutcomeStatus::Recompressed => self.recompressed += 1,
            OutcomeStatus::Unchanged => self.unchanged += 1,
        }
        self.original_bytes += outcome.original_size;
        self.final_bytes += outcome.final_size;
        self.current_index += 1;
    }

    /// Marks the current file as failed.
    pub fn fail_current(&mut self) {
        self.error_count += 1;
        self.current_index += 1;
    }

    /// Snapshot of the counters as a summary.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            root: self.root.clone(),
            total_files: self.files.len(),
            processed: self.current_index,
            error_count: self.error_count,
            recompressed: self.recompressed,
            unchanged: self.unchanged,
            original_bytes: self.original_bytes,
            final_bytes: self.final_bytes,
            saved_bytes: self.original_bytes as i64 - self.final_bytes as i64,
            ..RunSummary::default()
        }
    }
}
