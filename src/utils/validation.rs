use std::collections::BTreeSet;
use std::path::Path;
use crate::utils::{CompressorError, CompressorResult, ImageFormat, ValidationError};

/// Validates that the root exists and is a directory
pub fn validate_root_directory(path: &Path) -> CompressorResult<()> {
    if !path.exists() || !path.is_dir() {
        return Err(CompressorError::invalid_directory(path));
    }
    Ok(())
}

/// Validates a quality value against the 1-100 range
pub fn validate_quality(quality: u32) -> Result<(), ValidationError> {
    if quality == 0 || quality > 100 {
        return Err(ValidationError::Quality(quality));
    }
    Ok(())
}

/// Validates that the extension filter is non-empty and only names formats we can handle
pub fn validate_extension_filter(extensions: &BTreeSet<String>) -> Result<(), ValidationError> {
    if extensions.is_empty() {
        return Err(ValidationError::EmptyFilter);
    }

    for ext in extensions {
        ext.parse::<ImageFormat>()?;
    }

    Ok(())
}
