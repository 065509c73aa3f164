use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use crate::utils::ValidationError;

lazy_static::lazy_static! {
    /// Every extension the scanner accepts by default.
    pub static ref SUPPORTED_EXTENSIONS: BTreeSet<String> = ImageFormat::ALL
        .iter()
        .flat_map(|format| format.extensions().iter())
        .map(|ext| ext.to_string())
        .collect();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    JPEG,
    PNG,
    GIF,
    BMP,
    TIFF,
}

/// How a format gets smaller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Decode and re-encode at the requested quality
    Lossy,
    /// Decode and re-encode with the codec's best lossless settings
    Lossless,
    /// Hand the file to an external optimizer binary
    External,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 5] = [Self::JPEG, Self::PNG, Self::GIF, Self::BMP, Self::TIFF];

    /// Get file extensions associated with this format
    pub fn extensions(&self) -> &[&str] {
        match self {
            Self::JPEG => &["jpg", "jpeg"],
            Self::PNG => &["png"],
            Self::GIF => &["gif"],
            Self::BMP => &["bmp"],
            Self::TIFF => &["tiff", "tif"],
        }
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            Self::JPEG => Strategy::Lossy,
            Self::PNG | Self::BMP | Self::TIFF => Strategy::Lossless,
            Self::GIF => Strategy::External,
        }
    }

    /// Codec used to decode and re-encode in-process
    pub fn codec(&self) -> image::ImageFormat {
        match self {
            Self::JPEG => image::ImageFormat::Jpeg,
            Self::PNG => image::ImageFormat::Png,
            Self::GIF => image::ImageFormat::Gif,
            Self::BMP => image::ImageFormat::Bmp,
            Self::TIFF => image::ImageFormat::Tiff,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extensions()[0])
    }
}

impl FromStr for ImageFormat {
    type Err = ValidationError;

    fn from_str(ext: &str) -> Result<Self, Self::Err> {
        let ext = normalize_extension(ext);
        match ext.as_str() {
            "jpg" | "jpeg" => Ok(Self::JPEG),
            "png" => Ok(Self::PNG),
            "gif" => Ok(Self::GIF),
            "bmp" => Ok(Self::BMP),
            "tiff" | "tif" => Ok(Self::TIFF),
            _ => Err(ValidationError::UnsupportedExtension(ext)),
        }
    }
}

/// Lowercases an extension and strips a leading dot, so ".JPG" becomes "jpg".
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

/// Lowercased extension of `path`, if it has a UTF-8 one.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Get format from file extension
pub fn format_from_path(path: &Path) -> Result<ImageFormat, ValidationError> {
    let ext = extension_of(path).ok_or_else(|| {
        ValidationError::UnsupportedExtension(format!("no extension on {}", path.display()))
    })?;
    ImageFormat::from_str(&ext)
}
