//! Image compression ahead of upload
//!
//! The encoder only ever sees finished bytes. Decoding and recompressing a
//! photo happens here, before a part is built.

use std::io::Cursor;
use std::path::Path;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage};

use super::errors::EncodingError;

/// Quality used for uploads unless the caller picks another
pub const DEFAULT_JPEG_QUALITY: u8 = 30;

/// Compress a decoded image to JPEG
///
/// Alpha is dropped; JPEG has no transparency.
///
/// # Errors
///
/// `Image` if `quality` is outside `1..=100` or the encoder fails.
pub fn jpeg_from_image(image: &DynamicImage, quality: u8) -> Result<Bytes, EncodingError> {
    if !(1..=100).contains(&quality) {
        return Err(EncodingError::Image(format!("JPEG quality {quality} is outside 1..=100")));
    }

    let rgb = image.to_rgb8();
    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
        .map_err(|e| EncodingError::Image(e.to_string()))?;

    let out = out.into_inner();
    tracing::debug!(
        target: "tether::multipart",
        width = rgb.width(),
        height = rgb.height(),
        quality,
        bytes = out.len(),
        "Compressed image to JPEG"
    );
    Ok(Bytes::from(out))
}

/// Decode an encoded image (JPEG or PNG) and recompress it
///
/// # Errors
///
/// `Image` if the bytes cannot be decoded or re-encoded.
pub fn jpeg_from_bytes(encoded: &[u8], quality: u8) -> Result<Bytes, EncodingError> {
    let image = image::load_from_memory(encoded).map_err(|e| EncodingError::Image(e.to_string()))?;
    jpeg_from_image(&image, quality)
}

/// Load an image file and recompress it
///
/// # Errors
///
/// `Image` if the file cannot be read or decoded.
pub fn jpeg_from_file(path: impl AsRef<Path>, quality: u8) -> Result<Bytes, EncodingError> {
    let path = path.as_ref();
    let image = image::open(path)
        .map_err(|e| EncodingError::Image(format!("{}: {e}", path.display())))?;
    jpeg_from_image(&image, quality)
}
