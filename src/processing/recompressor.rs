//! In-place recompression of a single image file.
//!
//! Dispatches on [`ImageFormat`] to one of three strategies:
//! - lossy re-encode at the requested quality with optimized Huffman tables (JPEG)
//! - lossless optimization: oxipng for PNG, best-effort re-encode for BMP and TIFF
//! - external optimizer subprocess (GIF)
//!
//! Every write goes through a temporary file next to the original that is
//! renamed over it only on success, so a failed file is never left truncated.

use std::fs;
use std::io::Cursor;
use std::path::Path;
use image::{DynamicImage, GenericImageView, ImageOutputFormat};
use jpeg_encoder::{ColorType as JpegColor, Encoder as JpegEncoder, EncodingError};
use tracing::debug;

use crate::core::{OutcomeStatus, Quality, RecompressOutcome};
use crate::utils::{
    ImageFormat, RecompressError, Strategy, extract_filename, format_from_path, get_file_size,
    replace_with, temp_sibling, write_atomic,
};
use super::gif::GifOptimizerConfig;

type Result<T> = std::result::Result<T, RecompressError>;

/// oxipng preset; 4 tries every filter and reduction at a moderate deflate cost.
const PNG_PRESET: u8 = 4;

/// Recompresses files in place.
#[derive(Debug, Clone, Default)]
pub struct Recompressor {
    gif: GifOptimizerConfig,
}

impl Recompressor {
    pub fn new(gif: GifOptimizerConfig) -> Self {
        Self { gif }
    }

    /// Recompresses `path` in place.
    ///
    /// `quality` only affects lossy formats. For lossless and external
    /// strategies the original is kept when the new encoding is not strictly
    /// smaller, reported as [`OutcomeStatus::Unchanged`]. Multi-page TIFFs and
    /// animated PNGs are always kept as they are.
    pub fn recompress(&self, path: &Path, quality: Quality) -> Result<RecompressOutcome> {
        let format = format_from_path(path)
            .map_err(|e| RecompressError::new(path, e.to_string()))?;
        let strategy = format.strategy();

        let original_size = get_file_size(path)
            .map_err(|e| RecompressError::io(path, "Cannot read input file", e))?;

        let (status, final_size) = match strategy {
            Strategy::Lossy => reencode_lossy(path, format, quality)?,
            Strategy::Lossless => reencode_lossless(path, format, original_size)?,
            Strategy::External => self.optimize_external(path, original_size)?,
        };

        let outcome = RecompressOutcome {
            path: path.to_path_buf(),
            format,
            strategy,
            status,
            original_size,
            final_size,
        };

        debug!(
            "'{}' {:?} -> {} bytes saved ({:.1}%)",
            extract_filename(path),
            outcome.status,
            outcome.saved_bytes(),
            outcome.compression_ratio()
        );

        Ok(outcome)
    }

    fn optimize_external(&self, path: &Path, original_size: u64) -> Result<(OutcomeStatus, u64)> {
        let temp = temp_sibling(path)
            .map_err(|e| RecompressError::io(path, "Cannot create temporary file", e))?;

        self.gif.run(path, temp.path())?;

        let optimized_size = get_file_size(temp.path())
            .map_err(|e| RecompressError::io(path, "Cannot read optimizer output", e))?;
        if optimized_size == 0 {
            return Err(RecompressError::new(path, "GIF optimizer produced no output"));
        }

        keep_if_smaller(path, original_size, optimized_size, || {
            replace_with(temp, path)
                .map_err(|e| RecompressError::io(path, "Failed to replace original", e))
        })
    }
}

// ── Strategies ──────────────────────────────────────────────────────────────────────

fn reencode_lossy(path: &Path, format: ImageFormat, quality: Quality) -> Result<(OutcomeStatus, u64)> {
    let data = read_input(path)?;
    let image = decode(path, &data, format)?;
    let encoded = encode_jpeg(&image, quality)
        .map_err(|e| RecompressError::new(path, format!("JPEG encoding error: {e}")))?;

    write_atomic(path, &encoded)
        .map_err(|e| RecompressError::io(path, "Failed to write recompressed file", e))?;

    Ok((OutcomeStatus::Recompressed, encoded.len() as u64))
}

fn reencode_lossless(path: &Path, format: ImageFormat, original_size: u64) -> Result<(OutcomeStatus, u64)> {
    let data = read_input(path)?;

    let extra_images = holds_extra_images(format, &data)
        .map_err(|e| RecompressError::new(path, format!("Failed to decode image: {e}")))?;
    if extra_images {
        debug!(
            "Keeping '{}': {} holds more than one image",
            extract_filename(path),
            format
        );
        return Ok((OutcomeStatus::Unchanged, original_size));
    }

    let encoded = match format {
        ImageFormat::PNG => {
            let options = oxipng::Options::from_preset(PNG_PRESET);
            oxipng::optimize_from_memory(&data, &options).map_err(|e| e.to_string())
        }
        ImageFormat::BMP => encode_generic(&decode(path, &data, format)?, ImageOutputFormat::Bmp),
        ImageFormat::TIFF => encode_generic(&decode(path, &data, format)?, ImageOutputFormat::Tiff),
        other => Err(format!("no lossless encoder for {other}")),
    }
    .map_err(|e| RecompressError::new(path, format!("{format} encoding error: {e}")))?;

    keep_if_smaller(path, original_size, encoded.len() as u64, || {
        write_atomic(path, &encoded)
            .map_err(|e| RecompressError::io(path, "Failed to write recompressed file", e))
    })
}

/// Runs `replace` only when the new size beats the original.
fn keep_if_smaller<F>(
    path: &Path,
    original_size: u64,
    new_size: u64,
    replace: F,
) -> Result<(OutcomeStatus, u64)>
where
    F: FnOnce() -> Result<()>,
{
    if new_size < original_size {
        replace()?;
        Ok((OutcomeStatus::Recompressed, new_size))
    } else {
        debug!(
            "Keeping original '{}': re-encoded {} >= {} bytes",
            extract_filename(path),
            new_size,
            original_size
        );
        Ok((OutcomeStatus::Unchanged, original_size))
    }
}

// ── Codecs ──────────────────────────────────────────────────────────────────────────

fn read_input(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| RecompressError::io(path, "Cannot read input file", e))
}

fn decode(path: &Path, data: &[u8], format: ImageFormat) -> Result<DynamicImage> {
    image::load_from_memory_with_format(data, format.codec())
        .map_err(|e| RecompressError::new(path, format!("Failed to decode image: {e}")))
}

/// Whether the container holds more than the one image the codecs decode.
///
/// The in-process codecs only see the first page of a TIFF and the default
/// image of an APNG, so such files must not be re-encoded.
fn holds_extra_images(format: ImageFormat, data: &[u8]) -> std::result::Result<bool, String> {
    match format {
        ImageFormat::TIFF => {
            let decoder = tiff::decoder::Decoder::new(Cursor::new(data)).map_err(|e| e.to_string())?;
            Ok(decoder.more_images())
        }
        ImageFormat::PNG => {
            let reader = png::Decoder::new(Cursor::new(data))
                .read_info()
                .map_err(|e| e.to_string())?;
            Ok(reader.info().animation_control.is_some())
        }
        _ => Ok(false),
    }
}

fn encode_jpeg(image: &DynamicImage, quality: Quality) -> std::result::Result<Vec<u8>, String> {
    let (width, height) = image.dimensions();
    let (Ok(w), Ok(h)) = (u16::try_from(width), u16::try_from(height)) else {
        return Err(format!("{width}x{height} exceeds the 65535 pixel JPEG limit"));
    };

    let mut output = Vec::new();
    let mut encoder = JpegEncoder::new(&mut output, quality.value());
    encoder.set_optimized_huffman_tables(true);

    let written: std::result::Result<(), EncodingError> = match image {
        DynamicImage::ImageLuma8(gray) => encoder.encode(gray.as_raw(), w, h, JpegColor::Luma),
        // JPEG has no alpha channel and no 16-bit samples
        other => encoder.encode(other.to_rgb8().as_raw(), w, h, JpegColor::Rgb),
    };
    written.map_err(|e| e.to_string())?;

    Ok(output)
}

fn encode_generic(image: &DynamicImage, format: ImageOutputFormat) -> std::result::Result<Vec<u8>, String> {
    let mut output = Cursor::new(Vec::new());
    image.write_to(&mut output, format).map_err(|e| e.to_string())?;
    Ok(output.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::png::{CompressionType, FilterType, PngEncoder};
    use image::{ColorType, ImageEncoder, Luma, Rgb, RgbImage};
    use proptest::prelude::*;
    use crate::utils::Strategy;
    use std::path::PathBuf;

    /// Class/id byte and code-length counts of the Annex K luminance DC table.
    const STANDARD_LUMA_DC_TABLE: [u8; 17] = [
        0x00, 0x00, 0x01, 0x05, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00,
    ];

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 5 % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    /// Written with the image crate, whose encoder always emits the standard tables.
    fn write_jpeg(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let image = gradient(64, 48);
        let mut bytes = Vec::new();
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, 95)
            .encode(image.as_raw(), 64, 48, ColorType::Rgb8)
            .unwrap();
        fs::write(&path, bytes).unwrap();
        path
    }

    fn write_png_fast(dir: &Path, name: &str, image: &RgbImage) -> PathBuf {
        let path = dir.join(name);
        let mut bytes = Vec::new();
        PngEncoder::new_with_quality(&mut bytes, CompressionType::Fast, FilterType::NoFilter)
            .write_image(image.as_raw(), image.width(), image.height(), ColorType::Rgb8)
            .unwrap();
        fs::write(&path, bytes).unwrap();
        path
    }

    /// Black and white noise stored as 8-bit RGB.
    fn two_colour_noise(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            if (x * x * 31 + y * 17 + x * y * 7) % 11 < 5 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        })
    }

    fn write_tiff(path: &Path, pages: usize) {
        let image = gradient(32, 24);
        let mut bytes = Cursor::new(Vec::new());
        {
            let mut encoder = tiff::encoder::TiffEncoder::new(&mut bytes).unwrap();
            for _ in 0..pages {
                encoder
                    .write_image::<tiff::encoder::colortype::RGB8>(32, 24, image.as_raw())
                    .unwrap();
            }
        }
        fs::write(path, bytes.into_inner()).unwrap();
    }

    fn tiff_pages(path: &Path) -> usize {
        let mut decoder = tiff::decoder::Decoder::new(fs::File::open(path).unwrap()).unwrap();
        let mut pages = 1;
        while decoder.more_images() {
            decoder.next_image().unwrap();
            pages += 1;
        }
        pages
    }

    fn temp_files_in(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count()
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|window| window == needle)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn jpeg_keeps_dimensions_at_any_quality(q in 1u32..=100) {
            let dir = tempfile::tempdir().unwrap();
            let path = write_jpeg(dir.path(), "photo.jpg");

            let outcome = Recompressor::default()
                .recompress(&path, Quality::new(q).unwrap())
                .unwrap();

            prop_assert_eq!(outcome.status, OutcomeStatus::Recompressed);
            prop_assert_eq!(outcome.final_size, fs::metadata(&path).unwrap().len());
            prop_assert_eq!(image::open(&path).unwrap().dimensions(), (64, 48));
        }
    }

    #[test]
    fn jpeg_output_uses_optimized_huffman_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_jpeg(dir.path(), "a.jpg");
        assert!(contains(&fs::read(&path).unwrap(), &STANDARD_LUMA_DC_TABLE));

        Recompressor::default()
            .recompress(&path, Quality::DEFAULT)
            .unwrap();

        let output = fs::read(&path).unwrap();
        assert!(!contains(&output, &STANDARD_LUMA_DC_TABLE));
    }

    #[test]
    fn grayscale_jpeg_stays_grayscale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.jpg");
        image::GrayImage::from_fn(40, 20, |x, _| Luma([(x * 6) as u8]))
            .save(&path)
            .unwrap();

        Recompressor::default().recompress(&path, Quality::DEFAULT).unwrap();

        let decoded = image::open(&path).unwrap();
        assert_eq!(decoded.color(), ColorType::L8);
        assert_eq!(decoded.dimensions(), (40, 20));
    }

    #[test]
    fn low_quality_jpeg_is_smaller_than_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_jpeg(dir.path(), "a.jpg");

        let outcome = Recompressor::default()
            .recompress(&path, Quality::new(10).unwrap())
            .unwrap();

        assert!(outcome.saved_bytes() > 0);
    }

    #[test]
    fn recompressing_twice_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_jpeg(dir.path(), "a.jpeg");
        let recompressor = Recompressor::default();

        recompressor.recompress(&path, Quality::DEFAULT).unwrap();
        recompressor.recompress(&path, Quality::DEFAULT).unwrap();
        assert_eq!(image::open(&path).unwrap().dimensions(), (64, 48));
    }

    #[test]
    fn corrupt_jpeg_is_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        fs::write(&path, b"definitely not a jpeg").unwrap();

        let err = Recompressor::default()
            .recompress(&path, Quality::DEFAULT)
            .unwrap_err();

        assert_eq!(err.path, path);
        assert!(err.message.contains("decode"), "{}", err.message);
        assert_eq!(fs::read(&path).unwrap(), b"definitely not a jpeg");
        assert_eq!(temp_files_in(dir.path()), 0);
    }

    #[test]
    fn png_pixels_survive_lossless_pass() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png_fast(dir.path(), "a.png", &gradient(64, 48));
        let before = image::open(&path).unwrap().to_rgb8();

        let outcome = Recompressor::default()
            .recompress(&path, Quality::new(1).unwrap())
            .unwrap();

        assert_eq!(outcome.strategy, Strategy::Lossless);
        assert!(outcome.final_size <= outcome.original_size);
        assert_eq!(image::open(&path).unwrap().to_rgb8(), before);
    }

    #[test]
    fn two_colour_png_drops_to_a_smaller_colour_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png_fast(dir.path(), "bw.png", &two_colour_noise(64, 48));
        let before = image::open(&path).unwrap().to_rgb8();

        let outcome = Recompressor::default().recompress(&path, Quality::DEFAULT).unwrap();

        assert_eq!(outcome.status, OutcomeStatus::Recompressed);
        assert!(outcome.final_size < outcome.original_size);
        assert_eq!(image::open(&path).unwrap().to_rgb8(), before);

        let reader = png::Decoder::new(fs::File::open(&path).unwrap())
            .read_info()
            .unwrap();
        assert_ne!(reader.info().color_type, png::ColorType::Rgb);
    }

    #[test]
    fn animated_png_is_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anim.png");
        let frame_a = two_colour_noise(16, 16);
        let frame_b = gradient(16, 16);

        let mut bytes = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut bytes, 16, 16);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            encoder.set_compression(png::Compression::Fast);
            encoder.set_animated(2, 0).unwrap();
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(frame_a.as_raw()).unwrap();
            writer.write_image_data(frame_b.as_raw()).unwrap();
            writer.finish().unwrap();
        }
        fs::write(&path, &bytes).unwrap();

        let outcome = Recompressor::default().recompress(&path, Quality::DEFAULT).unwrap();

        assert_eq!(outcome.status, OutcomeStatus::Unchanged);
        assert_eq!(fs::read(&path).unwrap(), bytes);
    }

    #[test]
    fn multi_page_tiff_keeps_every_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.tiff");
        write_tiff(&path, 2);
        let before = fs::read(&path).unwrap();

        let outcome = Recompressor::default().recompress(&path, Quality::DEFAULT).unwrap();

        assert_eq!(outcome.status, OutcomeStatus::Unchanged);
        assert_eq!(tiff_pages(&path), 2);
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn single_page_tiff_is_reencoded_losslessly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.tif");
        write_tiff(&path, 1);
        let before = image::open(&path).unwrap().to_rgb8();

        let outcome = Recompressor::default().recompress(&path, Quality::DEFAULT).unwrap();

        assert_eq!(outcome.format, ImageFormat::TIFF);
        assert_eq!(tiff_pages(&path), 1);
        assert_eq!(image::open(&path).unwrap().to_rgb8(), before);
    }

    #[test]
    fn bmp_is_never_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.bmp");
        gradient(16, 16).save(&path).unwrap();

        let outcome = Recompressor::default().recompress(&path, Quality::DEFAULT).unwrap();

        assert_eq!(outcome.format, ImageFormat::BMP);
        assert_eq!(image::open(&path).unwrap().dimensions(), (16, 16));
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"hello").unwrap();

        let err = Recompressor::default().recompress(&path, Quality::DEFAULT).unwrap_err();
        assert!(err.message.contains("Unsupported"), "{}", err.message);
    }

    #[cfg(unix)]
    mod gif {
        use super::*;
        use std::time::Duration;

        fn fake_gif(dir: &Path) -> PathBuf {
            let path = dir.join("anim.gif");
            fs::write(&path, b"GIF89a-pretend-this-is-a-large-animation").unwrap();
            path
        }

        fn shell(script: &str) -> Recompressor {
            Recompressor::new(GifOptimizerConfig {
                program: "sh".to_string(),
                args: vec!["-c".to_string(), script.to_string()],
                timeout: Duration::from_secs(10),
            })
        }

        #[test]
        fn smaller_output_replaces_original() {
            let dir = tempfile::tempdir().unwrap();
            let path = fake_gif(dir.path());

            let outcome = shell("head -c 10 '{input}' > '{output}'")
                .recompress(&path, Quality::DEFAULT)
                .unwrap();

            assert_eq!(outcome.status, OutcomeStatus::Recompressed);
            assert_eq!(fs::read(&path).unwrap(), b"GIF89a-pre");
            assert_eq!(temp_files_in(dir.path()), 0);
        }

        #[test]
        fn same_size_output_keeps_original() {
            let dir = tempfile::tempdir().unwrap();
            let path = fake_gif(dir.path());

            let outcome = shell("cp '{input}' '{output}'")
                .recompress(&path, Quality::DEFAULT)
                .unwrap();

            assert_eq!(outcome.status, OutcomeStatus::Unchanged);
            assert_eq!(outcome.saved_bytes(), 0);
            assert_eq!(temp_files_in(dir.path()), 0);
        }

        #[test]
        fn empty_output_is_an_error() {
            let dir = tempfile::tempdir().unwrap();
            let path = fake_gif(dir.path());

            let err = shell("true").recompress(&path, Quality::DEFAULT).unwrap_err();

            assert!(err.message.contains("no output"), "{}", err.message);
            assert_eq!(fs::read(&path).unwrap(), b"GIF89a-pretend-this-is-a-large-animation");
        }

        #[test]
        fn failing_optimizer_keeps_original() {
            let dir = tempfile::tempdir().unwrap();
            let path = fake_gif(dir.path());

            let err = shell("echo nope > '{output}'; exit 1")
                .recompress(&path, Quality::DEFAULT)
                .unwrap_err();

            assert!(err.message.contains("failed"), "{}", err.message);
            assert_eq!(fs::read(&path).unwrap(), b"GIF89a-pretend-this-is-a-large-animation");
            assert_eq!(temp_files_in(dir.path()), 0);
        }
    }
}
