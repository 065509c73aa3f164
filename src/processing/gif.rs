//! External lossless GIF optimizer invocation.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};
use crate::utils::RecompressError;

const INPUT_PLACEHOLDER: &str = "{input}";
const OUTPUT_PLACEHOLDER: &str = "{output}";

/// How to call the external GIF optimizer.
///
/// `args` may contain `{input}` and `{output}` placeholders which are
/// substituted with the original file and the temporary output file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GifOptimizerConfig {
    pub program: String,
    pub args: Vec<String>,
    /// The child is killed once this expires
    pub timeout: Duration,
}

impl Default for GifOptimizerConfig {
    fn default() -> Self {
        Self {
            program: "gifsicle".to_string(),
            args: ["-O3", INPUT_PLACEHOLDER, "-o", OUTPUT_PLACEHOLDER]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl GifOptimizerConfig {
    fn expand_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(INPUT_PLACEHOLDER, &input)
                    .replace(OUTPUT_PLACEHOLDER, &output)
            })
            .collect()
    }

    /// Runs the optimizer from `input` into `output`.
    ///
    /// A missing binary, a non-zero exit or a timeout are all reported as a
    /// [`RecompressError`] against `input`. Blocks the calling thread; must
    /// not be called from inside an async task.
    pub fn run(&self, input: &Path, output: &Path) -> Result<(), RecompressError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| RecompressError::io(input, "Failed to start GIF optimizer runtime", e))?;

        runtime.block_on(self.execute(input, output))
    }

    async fn execute(&self, input: &Path, output: &Path) -> Result<(), RecompressError> {
        let args = self.expand_args(input, output);
        debug!("Executing: {} {}", self.program, args.join(" "));

        let start = Instant::now();
        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                let message = if e.kind() == std::io::ErrorKind::NotFound {
                    format!("GIF optimizer '{}' not found", self.program)
                } else {
                    format!("Failed to start GIF optimizer '{}': {}", self.program, e)
                };
                RecompressError::new(input, message)
            })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let finished = timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                warn!("GIF optimizer timed out after {:?} on {}", self.timeout, input.display());
                RecompressError::new(
                    input,
                    format!("GIF optimizer timed out after {}s", self.timeout.as_secs_f32()),
                )
            })?
            .map_err(|e| RecompressError::io(input, "Failed to wait for GIF optimizer", e))?;

        debug!(
            "GIF optimizer completed in {:.2}s with {}",
            start.elapsed().as_secs_f32(),
            finished.status
        );

        if !finished.status.success() {
            let stderr = String::from_utf8_lossy(&finished.stderr);
            let detail = stderr.trim();
            let message = if detail.is_empty() {
                format!("GIF optimizer failed ({})", finished.status)
            } else {
                format!("GIF optimizer failed ({}): {detail}", finished.status)
            };
            return Err(RecompressError::new(input, message));
        }

        Ok(())
    }
}
