//! Per-run collection and persistence of file failures.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use serde::Serialize;
use tracing::{debug, error};
use crate::utils::RecompressError;

/// File name of the failure log written into the run's root directory.
pub const ERROR_LOG_FILE: &str = "error_log.txt";

const ENTRY_SEPARATOR: &str = "------------------------";

/// One failed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorLogEntry {
    pub file_path: PathBuf,
    pub message: String,
}

impl ErrorLogEntry {
    fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "File: {}", single_line(&self.file_path.to_string_lossy()))?;
        writeln!(out, "Error: {}", single_line(&self.message))?;
        writeln!(out, "{ENTRY_SEPARATOR}")
    }
}

/// Folds multi-line text (optimizer stderr, mostly) onto one line so every
/// entry stays exactly three lines long.
fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}

impl From<RecompressError> for ErrorLogEntry {
    fn from(err: RecompressError) -> Self {
        Self {
            file_path: err.path,
            message: err.message,
        }
    }
}

/// Accumulates failures for one run.
///
/// When attached to a directory each entry is also appended to
/// [`ERROR_LOG_FILE`] as soon as it is recorded, so a crash mid-run still
/// leaves every failure seen so far on disk. The file is only created once
/// the first failure arrives; a previous run's log is truncated at that point.
#[derive(Debug, Default)]
pub struct ErrorSink {
    entries: Vec<ErrorLogEntry>,
    destination: Option<PathBuf>,
    log_started: bool,
    /// Set when an incremental append failed and the file is incomplete
    dirty: bool,
}

impl ErrorSink {
    /// In-memory sink; entries reach disk only through [`ErrorSink::flush`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that appends every entry to the log inside `directory`.
    pub fn incremental(directory: impl AsRef<Path>) -> Self {
        Self {
            destination: Some(directory.as_ref().join(ERROR_LOG_FILE)),
            ..Self::default()
        }
    }

    pub fn record(&mut self, path: impl Into<PathBuf>, message: impl Into<String>) {
        self.push(ErrorLogEntry {
            file_path: path.into(),
            message: message.into(),
        });
    }

    pub fn record_error(&mut self, err: RecompressError) {
        self.push(err.into());
    }

    fn push(&mut self, entry: ErrorLogEntry) {
        if let Some(destination) = self.destination.clone() {
            if let Err(e) = self.append(&destination, &entry) {
                error!("Failed to append to {}: {}", destination.display(), e);
                self.dirty = true;
            }
        }
        self.entries.push(entry);
    }

    fn append(&mut self, destination: &Path, entry: &ErrorLogEntry) -> io::Result<()> {
        let mut options = OpenOptions::new();
        if self.log_started {
            options.append(true);
        } else {
            options.write(true).create(true).truncate(true);
        }

        let mut file = options.open(destination)?;
        self.log_started = true;
        entry.write_to(&mut file)?;
        file.flush()
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Path of the log file, if this run has written one.
    pub fn log_path(&self) -> Option<&Path> {
        self.destination
            .as_deref()
            .filter(|_| self.log_started && !self.dirty)
    }

    /// Whether incremental appends already put every entry on disk.
    pub fn is_persisted(&self) -> bool {
        self.destination.is_some() && self.log_started && !self.dirty
    }

    /// Writes every recorded entry to [`ERROR_LOG_FILE`] in `directory`,
    /// replacing whatever the file held before.
    pub fn flush(&mut self, directory: impl AsRef<Path>) -> io::Result<PathBuf> {
        let path = directory.as_ref().join(ERROR_LOG_FILE);
        let mut out = BufWriter::new(File::create(&path)?);
        for entry in &self.entries {
            entry.write_to(&mut out)?;
        }
        out.flush()?;

        debug!("Wrote {} entries to {}", self.entries.len(), path.display());
        if self.destination.as_deref() == Some(path.as_path()) {
            self.log_started = true;
            self.dirty = false;
        }
        Ok(path)
    }
}
