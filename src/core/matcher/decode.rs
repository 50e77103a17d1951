//! Loading images as 8-bit intensity data.
//!
//! JPEG goes through zune-jpeg, decoding straight to luma; anything zune
//! rejects, and every other format, goes through the image crate.

use crate::core::files::read_file_bytes;
use crate::error::{FileError, MatchError};
use image::GrayImage;
use std::path::Path;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Load an image from disk as single-channel intensity data.
pub fn load_grayscale(path: &Path) -> Result<GrayImage, MatchError> {
    let bytes = read_file_bytes(path).map_err(|e| match e {
        FileError::NotFound { .. } => load_error(path, "file not found"),
        other => load_error(path, other.to_string()),
    })?;

    if bytes.is_empty() {
        return Err(load_error(path, "file is empty"));
    }

    if is_jpeg(path) {
        if let Some(image) = decode_jpeg_luma(&bytes) {
            return Ok(image);
        }
    }

    decode_fallback(path, &bytes)
}

fn is_jpeg(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref(),
        Some("jpg" | "jpeg")
    )
}

/// Fast JPEG decoding; `None` hands the file over to the fallback decoder
fn decode_jpeg_luma(bytes: &[u8]) -> Option<GrayImage> {
    let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::Luma);
    let mut decoder = JpegDecoder::new_with_options(bytes, options);

    let pixels = decoder.decode().ok()?;
    let info = decoder.info()?;

    if decoder.get_output_colorspace() != Some(ColorSpace::Luma) {
        return None;
    }

    GrayImage::from_raw(info.width as u32, info.height as u32, pixels)
}

fn decode_fallback(path: &Path, bytes: &[u8]) -> Result<GrayImage, MatchError> {
    image::load_from_memory(bytes)
        .map(|image| image.to_luma8())
        .map_err(|e| load_error(path, e.to_string()))
}

fn load_error(path: &Path, reason: impl Into<String>) -> MatchError {
    MatchError::ImageLoad {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma, Rgb};
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn loads_png_as_grayscale() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rgb.png");
        let rgb = ImageBuffer::from_fn(20, 10, |x, _| Rgb([(x * 10) as u8, 0, 0]));
        rgb.save(&path).unwrap();

        let gray = load_grayscale(&path).unwrap();

        assert_eq!(gray.dimensions(), (20, 10));
    }

    #[test]
    fn loads_jpeg() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gray.jpg");
        let gray: GrayImage = ImageBuffer::from_fn(32, 24, |x, y| Luma([((x + y) * 4) as u8]));
        gray.save(&path).unwrap();

        let loaded = load_grayscale(&path).unwrap();

        assert_eq!(loaded.dimensions(), (32, 24));
    }

    #[test]
    fn missing_file_fails_to_load() {
        let result = load_grayscale(Path::new("/nonexistent/photo.jpg"));
        assert!(matches!(result, Err(MatchError::ImageLoad { .. })));
    }

    #[test]
    fn zero_byte_file_fails_to_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.png");
        File::create(&path).unwrap();

        let result = load_grayscale(&path);

        match result {
            Err(MatchError::ImageLoad { reason, .. }) => assert!(reason.contains("empty")),
            other => panic!("expected load error, got {:?}", other.map(|i| i.dimensions())),
        }
    }

    #[test]
    fn corrupt_file_fails_to_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("corrupt.jpg");
        File::create(&path)
            .unwrap()
            .write_all(b"this is not a valid image file")
            .unwrap();

        assert!(load_grayscale(&path).is_err());
    }
}
