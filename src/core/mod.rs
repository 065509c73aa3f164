//! Core types and run state.
//!
//! This module contains the fundamental types used throughout the crate:
//! - [`Quality`] and [`ScanRequest`]: what a run is asked to do
//! - [`RunState`]: caller-owned state of a run in progress
//! - [`RecompressOutcome`] and [`RunSummary`]: per-file and per-run results
//! - [`Progress`] and [`ProgressReporter`]: notifications to the caller

mod state;
mod types;
mod progress;

pub use state::RunState;
pub use types::{OutcomeStatus, Quality, RecompressOutcome, RunSummary, ScanRequest};
pub use progress::{CallbackReporter, Progress, ProgressReporter, ProgressStatus};
