//! Error types for the image compressor.
//!
//! Provides a hierarchy of error types using `thiserror` for ergonomic error handling.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use serde::Serialize;

/// Validation errors for run settings.
#[derive(Error, Debug, Serialize, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Quality outside the 1-100 range
    #[error("Invalid quality value: {0}. Must be between 1 and 100")]
    Quality(u32),
    /// Extension filter contains nothing to scan for
    #[error("Extension filter is empty")]
    EmptyFilter,
    /// Extension filter names a format no strategy exists for
    #[error("Unsupported image format: {0}")]
    UnsupportedExtension(String),
}

/// Main error type for the compressor.
///
/// Only these conditions prevent a run from starting. Per-file failures are
/// reported as [`RecompressError`] and never surface here.
#[derive(Error, Debug, Serialize)]
pub enum CompressorError {
    /// Root does not exist or is not a directory
    #[error("Invalid directory: {0}")]
    InvalidDirectory(PathBuf),

    /// Scan found no matching images
    #[error("No images found in {0}")]
    EmptyDirectory(PathBuf),

    /// Run settings failed validation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Convenience result type for compressor operations.
pub type CompressorResult<T> = Result<T, CompressorError>;

impl CompressorError {
    pub fn invalid_directory(path: impl Into<PathBuf>) -> Self {
        Self::InvalidDirectory(path.into())
    }

    pub fn empty_directory(path: impl Into<PathBuf>) -> Self {
        Self::EmptyDirectory(path.into())
    }
}

/// A single file that could not be recompressed.
///
/// Always recoverable: the run records it and moves on to the next file.
#[derive(Error, Debug, Serialize, Clone, PartialEq, Eq)]
#[error("{}: {message}", .path.display())]
pub struct RecompressError {
    pub path: PathBuf,
    pub message: String,
}

impl RecompressError {
    pub fn new(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Wraps an IO failure with a short description of what was attempted.
    pub fn io(path: impl AsRef<Path>, action: &str, err: io::Error) -> Self {
        Self::new(path, format!("{action}: {err}"))
    }
}
