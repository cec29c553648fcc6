//! Parameter types for image operations.
//!
//! These structs describe *what* the pipeline does, not *how*. They are the
//! interface between configuration (which decides the constants) and the
//! [`pipeline`](super::pipeline) (which does the pixel work).
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 92). Clamped on construction.
//! - [`Sharpening`]: Unsharp-mask parameters (radius, percent, threshold).
//! - [`PipelineParams`]: Every constant of the derivation: margin, target size,
//!   zoom factor, both sharpening passes, contrast and quality.

use serde::{Deserialize, Serialize};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Quality as the encoder's byte-sized setting.
    pub fn as_u8(self) -> u8 {
        self.0.clamp(1, 100) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(92)
    }
}

/// Sharpening parameters for unsharp mask.
///
/// - `radius`: Standard deviation of the Gaussian blur, in pixels
/// - `percent`: How much of the difference to add back (100 = 1×)
/// - `threshold`: Minimum per-channel difference to sharpen (0 = sharpen all pixels)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Sharpening {
    pub radius: f32,
    pub percent: u32,
    pub threshold: u8,
}

impl Sharpening {
    /// Clarity pass for the full-frame primary image.
    pub fn primary() -> Self {
        Self {
            radius: 1.2,
            percent: 140,
            threshold: 3,
        }
    }

    /// Softer pass for the zoom image, which has already been sharpened once.
    pub fn zoom() -> Self {
        Self {
            radius: 1.0,
            percent: 120,
            threshold: 3,
        }
    }
}

/// All constants of the two-stage derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineParams {
    /// Side of both square outputs, in pixels.
    pub target_size: u32,
    /// Fraction of the short edge trimmed from every side of the raw tile.
    pub margin_fraction: f64,
    /// Zoom image = centered crop of side `target_size / zoom_factor`. Must be > 1.
    pub zoom_factor: f64,
    pub primary_sharpening: Sharpening,
    pub zoom_sharpening: Sharpening,
    /// Contrast multiplier applied after each sharpening pass (1.0 = unchanged).
    pub contrast: f32,
    pub quality: Quality,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            target_size: 2048,
            margin_fraction: 0.04,
            zoom_factor: 1.35,
            primary_sharpening: Sharpening::primary(),
            zoom_sharpening: Sharpening::zoom(),
            contrast: 1.05,
            quality: Quality::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_92() {
        assert_eq!(Quality::default().value(), 92);
        assert_eq!(Quality::default().as_u8(), 92);
    }

    #[test]
    fn zoom_sharpening_is_gentler() {
        let primary = Sharpening::primary();
        let zoom = Sharpening::zoom();
        assert!(zoom.radius < primary.radius);
        assert!(zoom.percent < primary.percent);
        assert_eq!(zoom.threshold, primary.threshold);
    }

    #[test]
    fn default_params_match_posting_setup() {
        let params = PipelineParams::default();
        assert_eq!(params.target_size, 2048);
        assert_eq!(params.margin_fraction, 0.04);
        assert_eq!(params.zoom_factor, 1.35);
        assert_eq!(params.contrast, 1.05);
    }
}
