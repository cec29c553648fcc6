//! Shared test utilities for the sat-cities test suite.
//!
//! Provides fixture builders (cities, synthetic satellite tiles) and mock
//! collaborators that record every call instead of touching the network.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let cities = springfield_trio();
//! let map = MockMap::serving(synthetic_jpeg(64, 64));
//! let social = MockSocial::failing_at(2);
//!
//! // ... run ...
//!
//! assert_eq!(map.requested(), vec![3]);
//! assert_eq!(social.get_operations().len(), 3);
//! ```

use std::io::Cursor;
use std::sync::Mutex;

use image::{ImageFormat, Rgb, RgbImage};

use crate::dataset::{CityId, CityRecord};
use crate::map::{FetchError, MapSource};
use crate::publish::{MediaId, NewPost, PostId, SocialApi, SocialError};

// =========================================================================
// Fixture builders
// =========================================================================

/// A city at Springfield, Illinois's coordinates with the given labels.
pub fn city(id: CityId, name: &str, state: &str, county: Option<&str>) -> CityRecord {
    CityRecord {
        id,
        latitude: 39.7817,
        longitude: -89.6501,
        name: name.to_string(),
        state: state.to_string(),
        county: county.map(str::to_string),
    }
}

/// Three Springfields with ids 1, 2, 3.
pub fn springfield_trio() -> Vec<CityRecord> {
    vec![
        city(1, "Springfield", "Illinois", Some("Sangamon")),
        city(2, "Springfield", "Massachusetts", Some("Hampden")),
        city(3, "Springfield", "Oregon", Some("Lane")),
    ]
}

/// A tile with enough structure for sharpening and cropping to matter.
pub fn synthetic_tile(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let field = if (x / 8 + y / 8) % 2 == 0 { 40 } else { 180 };
        Rgb([
            ((field + x * 3) % 256) as u8,
            ((field + y * 5) % 256) as u8,
            (((x ^ y) * 7) % 256) as u8,
        ])
    })
}

/// [`synthetic_tile`] encoded as a baseline JPEG, like a map API response.
pub fn synthetic_jpeg(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    synthetic_tile(width, height)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
        .unwrap();
    bytes
}

// =========================================================================
// Mock map source
// =========================================================================

/// Serves fixed bytes, or fails with a fixed status, and records every city id requested.
pub struct MockMap {
    response: Result<Vec<u8>, u16>,
    requests: Mutex<Vec<CityId>>,
}

impl MockMap {
    pub fn serving(bytes: Vec<u8>) -> Self {
        Self {
            response: Ok(bytes),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            response: Err(status),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<CityId> {
        self.requests.lock().unwrap().clone()
    }
}

impl MapSource for MockMap {
    fn fetch(&self, city: &CityRecord) -> Result<Vec<u8>, FetchError> {
        self.requests.lock().unwrap().push(city.id);
        match &self.response {
            Ok(bytes) => Ok(bytes.clone()),
            Err(status) => Err(FetchError::Status {
                status: *status,
                body: "mock failure".into(),
            }),
        }
    }
}

// =========================================================================
// Mock social API
// =========================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum SocialOp {
    Upload { bytes: Vec<u8>, mime: String },
    Post(NewPost),
}

/// Records calls; ids are `media-N` / `post-N` where N is the 0-based call index.
/// With `failing_at(n)` the n-th call (0-based) returns a 503.
#[derive(Default)]
pub struct MockSocial {
    operations: Mutex<Vec<SocialOp>>,
    fail_at: Option<usize>,
}

impl MockSocial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(call: usize) -> Self {
        Self {
            operations: Mutex::new(Vec::new()),
            fail_at: Some(call),
        }
    }

    pub fn get_operations(&self) -> Vec<SocialOp> {
        self.operations.lock().unwrap().clone()
    }

    /// Record `op` and return its call index, or the injected failure.
    fn record(&self, op: SocialOp) -> Result<usize, SocialError> {
        let mut ops = self.operations.lock().unwrap();
        let index = ops.len();
        ops.push(op);
        if self.fail_at == Some(index) {
            return Err(SocialError::Status {
                status: 503,
                body: "Service Unavailable".into(),
            });
        }
        Ok(index)
    }
}

impl SocialApi for MockSocial {
    fn upload_media(&self, bytes: &[u8], mime: &str) -> Result<MediaId, SocialError> {
        let index = self.record(SocialOp::Upload {
            bytes: bytes.to_vec(),
            mime: mime.to_string(),
        })?;
        Ok(MediaId(format!("media-{index}")))
    }

    fn create_post(&self, post: &NewPost) -> Result<PostId, SocialError> {
        let index = self.record(SocialOp::Post(post.clone()))?;
        Ok(PostId(format!("post-{index}")))
    }
}
