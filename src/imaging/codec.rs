//! Decode raw map tiles and encode finished JPEGs.
//!
//! Decoding goes through the `image` crate (format sniffed from the bytes,
//! since tiles arrive without a filename). Encoding goes through
//! `jpeg-encoder`, which exposes the knobs the `image` JPEG encoder hides:
//! chroma subsampling, progressive scans and optimized Huffman tables.

use super::params::Quality;
use image::{ImageReader, RgbImage};
use jpeg_encoder::{ColorType, Encoder, SamplingFactor};
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Image {width}x{height} is too small for a {margin}px margin crop")]
    TooSmall { width: u32, height: u32, margin: u32 },
    #[error("Zoom factor must be greater than 1, got {0}")]
    InvalidZoom(f64),
    #[error("JPEG encode failed: {0}")]
    Encode(String),
}

/// Decode encoded bytes (JPEG, PNG, WebP) into an 8-bit RGB buffer.
///
/// Alpha and palette images are flattened to RGB; a satellite tile carries no
/// useful transparency.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, ImageError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(ImageError::Io)?;
    let img = reader
        .decode()
        .map_err(|e| ImageError::Decode(e.to_string()))?;
    Ok(img.into_rgb8())
}

/// Encode as a progressive 4:2:2 JPEG with optimized Huffman tables.
///
/// 4:2:2 halves chroma horizontally only, which keeps road and field edges
/// crisper than the usual 4:2:0 at a modest size cost.
pub fn encode_jpeg(img: &RgbImage, quality: Quality) -> Result<Vec<u8>, ImageError> {
    let width = u16::try_from(img.width())
        .map_err(|_| ImageError::Encode(format!("width {} exceeds JPEG limit", img.width())))?;
    let height = u16::try_from(img.height())
        .map_err(|_| ImageError::Encode(format!("height {} exceeds JPEG limit", img.height())))?;

    let mut bytes = Vec::new();
    let mut encoder = Encoder::new(&mut bytes, quality.as_u8());
    encoder.set_sampling_factor(SamplingFactor::F_2_1);
    encoder.set_progressive(true);
    encoder.set_optimized_huffman_tables(true);
    encoder
        .encode(img.as_raw(), width, height, ColorType::Rgb)
        .map_err(|e| ImageError::Encode(e.to_string()))?;
    Ok(bytes)
}
