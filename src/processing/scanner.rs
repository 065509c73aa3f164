//! Directory traversal producing the list of files for a run.

use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, warn};
use walkdir::WalkDir;
use crate::core::ScanRequest;
use crate::utils::{CompressorError, CompressorResult, validate_root_directory};

/// Walks a directory tree and collects the files matching a [`ScanRequest`].
pub struct FileScanner;

impl FileScanner {
    /// Returns every regular file under the root whose extension is in the filter.
    ///
    /// Paths are absolute and unique. Entries within a directory are visited in
    /// file-name order. Symbolic links are never followed, so link cycles cannot
    /// be entered, and symlinked files are left out. Unreadable subdirectories
    /// are skipped with a warning.
    pub fn scan(request: &ScanRequest) -> CompressorResult<Vec<PathBuf>> {
        let root = &request.root_directory;
        validate_root_directory(root)?;

        let root = std::fs::canonicalize(root)
            .map_err(|_| CompressorError::invalid_directory(root))?;

        let mut seen = HashSet::new();
        let mut files = Vec::new();

        let walker = WalkDir::new(&root)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !request.matches(entry.path()) {
                continue;
            }

            let path = entry.into_path();
            if seen.insert(path.clone()) {
                files.push(path);
            }
        }

        debug!(
            "Scan of {} found {} files matching {:?}",
            root.display(),
            files.len(),
            request.extension_filter
        );

        Ok(files)
    }
}
