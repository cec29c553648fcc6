//! The two-stage derivation: raw tile → primary image → zoom image.
//!
//! ```text
//! raw bytes ─ decode ─ margin crop ─ Lanczos3 to R×R ─ unsharp + contrast ─┬─ JPEG → primary
//!                                                                          │
//!              centered crop R/zoom ─ Lanczos3 to R×R ─ unsharp + contrast ─┴─ JPEG → zoom
//! ```
//!
//! The zoom image is cut from the already enhanced primary buffer rather
//! than fetched again at a higher zoom level, so both posts share the same
//! lighting and processing and differ only in framing.

use super::calculations::{CropBox, calculate_margin, calculate_margin_crop, calculate_zoom_crop};
use super::codec::{ImageError, decode_rgb, encode_jpeg};
use super::enhance::enhance;
use super::params::PipelineParams;
use image::RgbImage;
use image::imageops::{self, FilterType};
use std::fs;
use std::path::{Path, PathBuf};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, ImageError>;

/// One finished JPEG with its pixel dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// The two images posted for one city.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedPair {
    pub primary: EncodedImage,
    pub zoom: EncodedImage,
}

impl DerivedPair {
    /// Write `primary.jpg` and `zoom.jpg` into `dir`, creating it if needed.
    pub fn save_to(&self, dir: &Path) -> Result<(PathBuf, PathBuf)> {
        fs::create_dir_all(dir)?;
        let primary_path = dir.join("primary.jpg");
        let zoom_path = dir.join("zoom.jpg");
        fs::write(&primary_path, &self.primary.bytes)?;
        fs::write(&zoom_path, &self.zoom.bytes)?;
        Ok((primary_path, zoom_path))
    }
}

/// Pre-encode pixel buffers of both images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedBuffers {
    pub primary: RgbImage,
    pub zoom: RgbImage,
}

fn crop(img: &RgbImage, rect: CropBox) -> RgbImage {
    imageops::crop_imm(img, rect.x, rect.y, rect.width, rect.height).to_image()
}

/// Stage one: trim the tile border, scale to the target square, enhance.
pub fn derive_primary(raw: &RgbImage, params: &PipelineParams) -> Result<RgbImage> {
    let dims = raw.dimensions();
    let rect = calculate_margin_crop(dims, params.margin_fraction).ok_or_else(|| {
        ImageError::TooSmall {
            width: dims.0,
            height: dims.1,
            margin: calculate_margin(dims, params.margin_fraction),
        }
    })?;

    let trimmed = crop(raw, rect);
    let resized = imageops::resize(
        &trimmed,
        params.target_size,
        params.target_size,
        FilterType::Lanczos3,
    );
    Ok(enhance(&resized, params.primary_sharpening, params.contrast))
}

/// Stage two: centered crop of the enhanced primary, scaled back up, enhanced again.
pub fn derive_zoom(primary: &RgbImage, params: &PipelineParams) -> Result<RgbImage> {
    let size = primary.width().min(primary.height());
    let rect = calculate_zoom_crop(size, params.zoom_factor)
        .ok_or(ImageError::InvalidZoom(params.zoom_factor))?;

    let cropped = crop(primary, rect);
    let resized = imageops::resize(&cropped, size, size, FilterType::Lanczos3);
    Ok(enhance(&resized, params.zoom_sharpening, params.contrast))
}

/// Run both stages on an already decoded image, stopping before encoding.
pub fn derive_buffers(raw: &RgbImage, params: &PipelineParams) -> Result<DerivedBuffers> {
    let primary = derive_primary(raw, params)?;
    let zoom = derive_zoom(&primary, params)?;
    Ok(DerivedBuffers { primary, zoom })
}

/// Decode raw tile bytes and produce the encoded primary/zoom pair.
///
/// Nothing is returned unless both images encode successfully.
pub fn derive_pair(raw_bytes: &[u8], params: &PipelineParams) -> Result<DerivedPair> {
    let raw = decode_rgb(raw_bytes)?;
    let buffers = derive_buffers(&raw, params)?;

    Ok(DerivedPair {
        primary: encode(&buffers.primary, params)?,
        zoom: encode(&buffers.zoom, params)?,
    })
}

fn encode(img: &RgbImage, params: &PipelineParams) -> Result<EncodedImage> {
    Ok(EncodedImage {
        bytes: encode_jpeg(img, params.quality)?,
        width: img.width(),
        height: img.height(),
    })
}
