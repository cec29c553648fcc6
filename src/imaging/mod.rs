//! Image derivation in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` with format sniffing |
//! | **Crop** | `image::imageops::crop_imm` |
//! | **Resize** | `image::imageops::resize` with `Lanczos3` |
//! | **Sharpen** | `image::imageops::blur` + percent-weighted unsharp mask |
//! | **Contrast** | mean-luma scaling |
//! | **Encode** | `jpeg-encoder` (progressive, 4:2:2, optimized Huffman) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop geometry (unit testable)
//! - **Parameters**: Data structures describing the pipeline constants
//! - **Enhance**: Unsharp mask and contrast filters
//! - **Codec**: Decode raw tiles, encode finished JPEGs
//! - **Pipeline**: The two stages combining all of the above

mod calculations;
pub mod codec;
pub mod enhance;
mod params;
pub mod pipeline;

pub use codec::ImageError;
pub use params::{PipelineParams, Quality, Sharpening};
pub use pipeline::{DerivedBuffers, DerivedPair, EncodedImage, derive_buffers, derive_pair};
