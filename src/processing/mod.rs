mod batch;
mod error_sink;
mod gif;
mod recompressor;
mod scanner;

pub use batch::{LogMode, RunConfig, RunController, RunMetrics};
pub use error_sink::{ERROR_LOG_FILE, ErrorLogEntry, ErrorSink};
pub use gif::GifOptimizerConfig;
pub use recompressor::Recompressor;
pub use scanner::FileScanner;
