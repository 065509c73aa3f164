pub mod error;
pub mod validation;
pub mod formats;
pub mod fs;

pub use error::{CompressorError, CompressorResult, RecompressError, ValidationError};
pub use validation::{validate_extension_filter, validate_quality, validate_root_directory};
pub use formats::{
    ImageFormat,
    Strategy,
    SUPPORTED_EXTENSIONS,
    extension_of,
    format_from_path,
    normalize_extension,
};
pub use fs::{
    extract_filename,
    get_file_size,
    replace_with,
    temp_sibling,
    write_atomic,
};
