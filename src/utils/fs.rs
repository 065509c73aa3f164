use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

const TEMP_PREFIX: &str = ".recompress-";
const TEMP_SUFFIX: &str = ".tmp";

/// Get file size in bytes
pub fn get_file_size(path: impl AsRef<Path>) -> io::Result<u64> {
    fs::metadata(path.as_ref()).map(|m| m.len())
}

/// File name component for log lines, falling back to the full path.
pub fn extract_filename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Creates an empty temporary file in the same directory as `target`.
///
/// Same directory means the final rename never crosses a filesystem. The file
/// is deleted on drop unless it is persisted with [`replace_with`].
pub fn temp_sibling(target: &Path) -> io::Result<NamedTempFile> {
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
}

/// Atomically replaces `target` with the contents of `temp`.
///
/// The original's permissions are carried over before the rename.
pub fn replace_with(temp: NamedTempFile, target: &Path) -> io::Result<()> {
    let permissions = fs::metadata(target)?.permissions();
    fs::set_permissions(temp.path(), permissions)?;
    temp.persist(target).map_err(|e| e.error)?;
    debug!("Replaced {}", target.display());
    Ok(())
}

/// Writes `bytes` over `target` all-or-nothing.
///
/// On any failure the temporary file is removed and `target` is untouched.
pub fn write_atomic(target: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut temp = temp_sibling(target)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    replace_with(temp, target)
}
