// Module declarations in dependency order
pub mod utils;
pub mod core;
pub mod processing;
pub mod worker;
pub mod commands;

// Public exports for external consumers
pub use crate::core::{
    CallbackReporter, OutcomeStatus, Progress, ProgressReporter, ProgressStatus, Quality,
    RecompressOutcome, RunState, RunSummary, ScanRequest,
};
pub use crate::processing::{
    ERROR_LOG_FILE, ErrorSink, FileScanner, GifOptimizerConfig, LogMode, Recompressor, RunConfig,
    RunController,
};
pub use crate::utils::{CompressorError, CompressorResult, ImageFormat, RecompressError, ValidationError};
pub use crate::worker::{RunEvent, RunHandle, WorkerError, spawn_run};
pub use crate::commands::*;

// This library file is used as a public API for consuming this crate as a library.
// The command-line entry point is in main.rs.
