//! Core types for recompression settings and results.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::utils::{
    ImageFormat, Strategy, ValidationError, SUPPORTED_EXTENSIONS, normalize_extension,
    validate_quality,
};

/// Lossy encoding quality on a 1-100 scale.
///
/// Higher values preserve more fidelity and produce larger files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quality(u8);

impl Quality {
    pub const DEFAULT: Quality = Quality(85);

    pub fn new(value: u32) -> Result<Self, ValidationError> {
        validate_quality(value)?;
        Ok(Self(value as u8))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for Quality {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quality> for u32 {
    fn from(quality: Quality) -> Self {
        quality.0 as u32
    }
}

/// What to scan for: a root directory and the extensions to pick up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Directory to walk recursively
    pub root_directory: PathBuf,
    /// Lowercase extensions without the leading dot
    pub extension_filter: BTreeSet<String>,
}

impl ScanRequest {
    /// Scans for every supported extension.
    pub fn new(root_directory: impl Into<PathBuf>) -> Self {
        Self {
            root_directory: root_directory.into(),
            extension_filter: SUPPORTED_EXTENSIONS.clone(),
        }
    }

    /// Restricts the scan to `extensions`, normalising case and leading dots.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extension_filter = extensions
            .into_iter()
            .map(|ext| normalize_extension(ext.as_ref()))
            .filter(|ext| !ext.is_empty())
            .collect();
        self
    }

    pub fn matches(&self, path: &Path) -> bool {
        crate::utils::extension_of(path)
            .is_some_and(|ext| self.extension_filter.contains(&ext))
    }
}

/// What happened to a file that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// File was rewritten
    Recompressed,
    /// Re-encoded output was not smaller, original kept
    Unchanged,
}

/// Result of recompressing a single file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecompressOutcome {
    pub path: PathBuf,
    pub format: ImageFormat,
    pub strategy: Strategy,
    pub status: OutcomeStatus,
    /// Size before recompression in bytes
    pub original_size: u64,
    /// Size on disk afterwards in bytes
    pub final_size: u64,
}

impl RecompressOutcome {
    /// Bytes saved (negative if a lossy re-encode grew the file)
    pub fn saved_bytes(&self) -> i64 {
        self.original_size as i64 - self.final_size as i64
    }

    /// Saved bytes as a percentage of the original size
    pub fn compression_ratio(&self) -> f64 {
        if self.original_size > 0 {
            self.saved_bytes() as f64 / self.original_size as f64 * 100.0
        } else {
            0.0
        }
    }
}

/// Final report of a run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub root: PathBuf,
    /// Files found by the scan
    pub total_files: usize,
    /// Files attempted before the run ended
    pub processed: usize,
    pub error_count: usize,
    pub recompressed: usize,
    pub unchanged: usize,
    pub original_bytes: u64,
    pub final_bytes: u64,
    pub saved_bytes: i64,
    pub elapsed_ms: u64,
    /// Location of the error log, when one was written
    pub error_log: Option<PathBuf>,
    pub cancelled: bool,
}
