mod config;
mod metrics;
mod processor;

pub use config::{LogMode, RunConfig};
pub use metrics::RunMetrics;
pub use processor::RunController;
