use std::time::{Duration, Instant};
use tracing::debug;

/// Timing of a run, logged once it ends.
#[derive(Debug, Clone)]
pub struct RunMetrics {
    started: Instant,
    slowest: Duration,
    files: usize,
}

impl RunMetrics {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            slowest: Duration::ZERO,
            files: 0,
        }
    }

    pub fn record_file(&mut self, took: Duration) {
        self.files += 1;
        self.slowest = self.slowest.max(took);
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn avg_per_file_ms(&self) -> f64 {
        if self.files == 0 {
            return 0.0;
        }
        self.elapsed().as_secs_f64() * 1000.0 / self.files as f64
    }

    pub fn log_summary(&self) {
        debug!(
            "Run timing - Files: {}, Total: {:.2}s, Avg: {:.1}ms, Slowest: {}ms",
            self.files,
            self.elapsed().as_secs_f64(),
            self.avg_per_file_ms(),
            self.slowest.as_millis()
        );
    }
}
