use std::collections::BTreeSet;
use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use crate::core::{Quality, ScanRequest};
use crate::processing::gif::GifOptimizerConfig;
use crate::utils::{CompressorResult, SUPPORTED_EXTENSIONS, normalize_extension, validate_extension_filter};

/// When failures reach the error log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum LogMode {
    /// Append each failure as it happens
    #[default]
    Incremental,
    /// Write the whole log once after the last file
    AtEnd,
}

/// Everything a run needs besides its callbacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub root_directory: PathBuf,
    pub extensions: BTreeSet<String>,
    pub quality: Quality,
    pub gif_optimizer: GifOptimizerConfig,
    pub log_mode: LogMode,
}

impl RunConfig {
    pub fn new(root_directory: impl Into<PathBuf>) -> Self {
        Self {
            root_directory: root_directory.into(),
            extensions: SUPPORTED_EXTENSIONS.clone(),
            quality: Quality::default(),
            gif_optimizer: GifOptimizerConfig::default(),
            log_mode: LogMode::default(),
        }
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    /// Narrows the run to `extensions`, case-insensitive and with or without a leading dot.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|ext| normalize_extension(ext.as_ref()))
            .filter(|ext| !ext.is_empty())
            .collect();
        self
    }

    pub fn with_gif_optimizer(mut self, gif_optimizer: GifOptimizerConfig) -> Self {
        self.gif_optimizer = gif_optimizer;
        self
    }

    pub fn with_log_mode(mut self, log_mode: LogMode) -> Self {
        self.log_mode = log_mode;
        self
    }

    /// Checks settings that do not need the filesystem.
    pub fn validate(&self) -> CompressorResult<()> {
        validate_extension_filter(&self.extensions)?;
        Ok(())
    }

    pub fn scan_request(&self) -> ScanRequest {
        ScanRequest {
            root_directory: self.root_directory.clone(),
            extension_filter: self.extensions.clone(),
        }
    }
}
