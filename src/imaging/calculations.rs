//! Pure calculation functions for crop geometry.
//!
//! All functions here are pure and testable without any I/O or images.

/// A rectangle inside an image, in pixels, anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Border trimmed from every side: `floor(min(width, height) * fraction)`.
pub fn calculate_margin(dims: (u32, u32), fraction: f64) -> u32 {
    let short_edge = dims.0.min(dims.1);
    (short_edge as f64 * fraction).floor() as u32
}

/// Center micro-crop that removes the same margin from every side.
///
/// Returns `None` when the margin would consume the whole image.
///
/// ```text
/// 2560x2560 at 4% → margin 102 → 2356x2356 at (102, 102)
/// ```
pub fn calculate_margin_crop(dims: (u32, u32), fraction: f64) -> Option<CropBox> {
    let (width, height) = dims;
    let margin = calculate_margin(dims, fraction);
    let inner_w = width.checked_sub(margin * 2).filter(|&w| w > 0)?;
    let inner_h = height.checked_sub(margin * 2).filter(|&h| h > 0)?;

    Some(CropBox {
        x: margin,
        y: margin,
        width: inner_w,
        height: inner_h,
    })
}

/// Centered square crop of side `floor(size / zoom_factor)` inside a
/// `size × size` image.
///
/// Returns `None` for a zoom factor of 1 or less, or when the crop would be
/// empty.
///
/// ```text
/// 2048 at 1.35 → side 1517 at (265, 265)
/// ```
pub fn calculate_zoom_crop(size: u32, zoom_factor: f64) -> Option<CropBox> {
    if !(zoom_factor > 1.0) {
        return None;
    }
    let side = (size as f64 / zoom_factor).floor() as u32;
    if side == 0 {
        return None;
    }
    let offset = (size - side) / 2;

    Some(CropBox {
        x: offset,
        y: offset,
        width: side,
        height: side,
    })
}
