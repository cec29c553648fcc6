//! Bot configuration.
//!
//! Two sources, kept strictly apart:
//!
//! - **`bot.toml`**: paths, map request shape, image pipeline constants and
//!   posting options. Every key is optional; stock defaults are serialized to
//!   a TOML table and the user file is merged on top, so a config file only
//!   needs the values it changes. Unknown keys are rejected to catch typos.
//! - **Environment**: credentials only, never written to `bot.toml`. An
//!   optional `.env` file is loaded first (existing variables win). Every
//!   required variable is checked up front and all missing names are
//!   reported together.
//!
//! ## Configuration Options
//!
//! ```toml
//! [data]
//! dataset = "cities.csv"       # CSV with id, latitude, longitude, name, state, county
//! used_ids = "used.txt"        # Append-only list of posted ids
//!
//! [map]
//! base_url = "https://api.mapbox.com"
//! style = "mapbox/satellite-v9"
//! zoom = 13.8
//! bearing = 0.0
//! pitch = 0.0
//! size = "1280x1280@2x"        # @2x renders ~2560px, downscaled once
//! timeout_secs = 20
//!
//! [imaging]
//! target_size = 2048
//! margin_fraction = 0.04
//! zoom_factor = 1.35
//! quality = 92
//! contrast = 1.05
//!
//! [imaging.primary_sharpen]
//! radius = 1.2
//! percent = 140
//! threshold = 3
//!
//! [imaging.zoom_sharpen]
//! radius = 1.0
//! percent = 120
//! threshold = 3
//!
//! [post]
//! caption_prefix = "📍 "
//! api_base = "https://api.twitter.com"
//! upload_base = "https://upload.twitter.com"
//! timeout_secs = 60
//! ```

use crate::imaging::{PipelineParams, Quality, Sharpening};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MAPBOX_TOKEN: &str = "MAPBOX_TOKEN";
pub const API_KEY: &str = "API_KEY";
pub const API_KEY_SECRET: &str = "API_KEY_SECRET";
pub const ACCESS_TOKEN: &str = "ACCESS_TOKEN";
pub const ACCESS_TOKEN_SECRET: &str = "ACCESS_TOKEN_SECRET";
pub const BEARER_TOKEN: &str = "BEARER_TOKEN";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Cannot load env file: {0}")]
    EnvFile(#[from] dotenvy::Error),
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingEnv(Vec<&'static str>),
}

/// Bot configuration loaded from `bot.toml`.
///
/// All fields have defaults matching the posting setup. Unknown keys are
/// rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BotConfig {
    /// Dataset and used-id file locations.
    pub data: DataConfig,
    /// Static map request parameters.
    pub map: MapConfig,
    /// Image pipeline constants.
    pub imaging: ImagingConfig,
    /// Posting options.
    pub post: PostConfig,
}

impl BotConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let imaging = &self.imaging;
        if imaging.quality == 0 || imaging.quality > 100 {
            return Err(ConfigError::Validation(
                "imaging.quality must be 1-100".into(),
            ));
        }
        if imaging.target_size == 0 || imaging.target_size > u32::from(u16::MAX) {
            return Err(ConfigError::Validation(
                "imaging.target_size must be between 1 and 65535".into(),
            ));
        }
        if !(imaging.zoom_factor > 1.0) {
            return Err(ConfigError::Validation(
                "imaging.zoom_factor must be greater than 1".into(),
            ));
        }
        if !(0.0..0.5).contains(&imaging.margin_fraction) {
            return Err(ConfigError::Validation(
                "imaging.margin_fraction must be in [0, 0.5)".into(),
            ));
        }
        if !(imaging.contrast > 0.0) {
            return Err(ConfigError::Validation(
                "imaging.contrast must be positive".into(),
            ));
        }
        for (name, sharpen) in [
            ("primary_sharpen", &imaging.primary_sharpen),
            ("zoom_sharpen", &imaging.zoom_sharpen),
        ] {
            if !(sharpen.radius >= 0.0) {
                return Err(ConfigError::Validation(format!(
                    "imaging.{name}.radius must not be negative"
                )));
            }
        }
        if self.map.size.trim().is_empty() {
            return Err(ConfigError::Validation("map.size must not be empty".into()));
        }
        if self.map.timeout_secs == 0 || self.post.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "map.timeout_secs and post.timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Dataset and used-id file locations, relative to the working directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    pub dataset: PathBuf,
    pub used_ids: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("cities.csv"),
            used_ids: PathBuf::from("used.txt"),
        }
    }
}

/// Static map request: `{base_url}/styles/v1/{style}/static/{lon},{lat},{zoom},{bearing},{pitch}/{size}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapConfig {
    pub base_url: String,
    pub style: String,
    pub zoom: f64,
    pub bearing: f64,
    pub pitch: f64,
    /// `WIDTHxHEIGHT`, optionally with `@2x` for retina tiles.
    pub size: String,
    /// Upper bound on the whole image download.
    pub timeout_secs: u64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.mapbox.com".into(),
            style: "mapbox/satellite-v9".into(),
            zoom: 13.8,
            bearing: 0.0,
            pitch: 0.0,
            size: "1280x1280@2x".into(),
            timeout_secs: 20,
        }
    }
}

/// Image pipeline constants; see [`PipelineParams`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagingConfig {
    pub target_size: u32,
    pub margin_fraction: f64,
    pub zoom_factor: f64,
    pub quality: u32,
    pub contrast: f32,
    pub primary_sharpen: Sharpening,
    pub zoom_sharpen: Sharpening,
}

impl Default for ImagingConfig {
    fn default() -> Self {
        let params = PipelineParams::default();
        Self {
            target_size: params.target_size,
            margin_fraction: params.margin_fraction,
            zoom_factor: params.zoom_factor,
            quality: params.quality.value(),
            contrast: params.contrast,
            primary_sharpen: params.primary_sharpening,
            zoom_sharpen: params.zoom_sharpening,
        }
    }
}

impl ImagingConfig {
    pub fn to_params(&self) -> PipelineParams {
        PipelineParams {
            target_size: self.target_size,
            margin_fraction: self.margin_fraction,
            zoom_factor: self.zoom_factor,
            primary_sharpening: self.primary_sharpen,
            zoom_sharpening: self.zoom_sharpen,
            contrast: self.contrast,
            quality: Quality::new(self.quality),
        }
    }
}

/// Posting options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PostConfig {
    /// Prepended to the caption of the primary post.
    pub caption_prefix: String,
    /// Base URL for post creation (`/2/tweets`).
    pub api_base: String,
    /// Base URL for media upload (`/1.1/media/upload.json`).
    pub upload_base: String,
    pub timeout_secs: u64,
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            caption_prefix: "📍 ".into(),
            api_base: "https://api.twitter.com".into(),
            upload_base: "https://upload.twitter.com".into(),
            timeout_secs: 60,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(BotConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<BotConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BotConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a TOML file.
///
/// A missing file yields the validated stock defaults. A file that exists
/// but is invalid TOML, has unknown keys or out-of-range values is an error.
pub fn load_config(path: &Path) -> Result<BotConfig, ConfigError> {
    if !path.exists() {
        return resolve_config(None);
    }
    let content = fs::read_to_string(path)?;
    let overlay: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(overlay))
}

/// Returns a fully-commented stock `bot.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Satellite city bot configuration
# ================================
# All settings are optional. Values shown below are the defaults.
# Unknown keys cause an error.
#
# Credentials are NOT read from this file. Set them in the environment or in
# a .env file next to the binary:
#   MAPBOX_TOKEN, API_KEY, API_KEY_SECRET, ACCESS_TOKEN,
#   ACCESS_TOKEN_SECRET, BEARER_TOKEN

# ---------------------------------------------------------------------------
# Data files
# ---------------------------------------------------------------------------
[data]
# CSV with header: id,latitude,longitude,name,state,county
dataset = "cities.csv"

# Append-only list of posted city ids, one per line.
# Never edit existing lines; a listed id is never posted again.
used_ids = "used.txt"

# ---------------------------------------------------------------------------
# Static map request
# ---------------------------------------------------------------------------
[map]
base_url = "https://api.mapbox.com"
style = "mapbox/satellite-v9"
zoom = 13.8
bearing = 0.0
pitch = 0.0

# 1280x1280@2x renders ~2560x2560: a good source for a single downscale.
size = "1280x1280@2x"

# Seconds to wait for the image download before giving up.
timeout_secs = 20

# ---------------------------------------------------------------------------
# Image pipeline
# ---------------------------------------------------------------------------
[imaging]
# Side of both square output images, in pixels.
target_size = 2048

# Fraction of the short edge trimmed from every side of the raw tile.
margin_fraction = 0.04

# The zoom reply shows the center 1/zoom_factor of the primary. Must be > 1.
zoom_factor = 1.35

# JPEG quality (1 = worst, 100 = best).
quality = 92

# Contrast multiplier applied after sharpening (1.0 = unchanged).
contrast = 1.05

# Unsharp mask for the primary image.
[imaging.primary_sharpen]
radius = 1.2
percent = 140
threshold = 3

# Softer unsharp mask for the zoom image.
[imaging.zoom_sharpen]
radius = 1.0
percent = 120
threshold = 3

# ---------------------------------------------------------------------------
# Posting
# ---------------------------------------------------------------------------
[post]
# Prepended to "<name>, <county> County, <state>".
caption_prefix = "📍 "
api_base = "https://api.twitter.com"
upload_base = "https://upload.twitter.com"
timeout_secs = 60
"##
}

// =============================================================================
// Credentials
// =============================================================================

/// A credential value that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// OAuth 1.0a user-context keys plus the app bearer token.
#[derive(Debug, Clone)]
pub struct TwitterCredentials {
    pub api_key: Secret,
    pub api_key_secret: Secret,
    pub access_token: Secret,
    pub access_token_secret: Secret,
    pub bearer_token: Secret,
}

/// Every credential a full run needs.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub mapbox_token: Secret,
    pub twitter: TwitterCredentials,
}

/// Collects lookups and remembers every missing name.
struct EnvReader<F> {
    lookup: F,
    missing: Vec<&'static str>,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn new(lookup: F) -> Self {
        Self {
            lookup,
            missing: Vec::new(),
        }
    }

    fn require(&mut self, name: &'static str) -> Secret {
        match (self.lookup)(name).filter(|v| !v.trim().is_empty()) {
            Some(value) => Secret(value),
            None => {
                self.missing.push(name);
                Secret(String::new())
            }
        }
    }

    fn finish<T>(self, value: T) -> Result<T, ConfigError> {
        if self.missing.is_empty() {
            Ok(value)
        } else {
            Err(ConfigError::MissingEnv(self.missing))
        }
    }
}

impl Credentials {
    /// Read all credentials from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read all credentials through `lookup`; blank values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut env = EnvReader::new(lookup);
        let credentials = Self {
            mapbox_token: env.require(MAPBOX_TOKEN),
            twitter: TwitterCredentials {
                api_key: env.require(API_KEY),
                api_key_secret: env.require(API_KEY_SECRET),
                access_token: env.require(ACCESS_TOKEN),
                access_token_secret: env.require(ACCESS_TOKEN_SECRET),
                bearer_token: env.require(BEARER_TOKEN),
            },
        };
        env.finish(credentials)
    }
}

/// Only the map token, for commands that never post.
pub fn mapbox_token_from_env() -> Result<Secret, ConfigError> {
    mapbox_token_from_lookup(|name| std::env::var(name).ok())
}

pub fn mapbox_token_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Secret, ConfigError> {
    let mut env = EnvReader::new(lookup);
    let token = env.require(MAPBOX_TOKEN);
    env.finish(token)
}

/// Load `.env` values into the process environment.
///
/// An explicit path must exist; the implicit `.env` lookup is best-effort.
pub fn load_env_file(path: Option<&Path>) -> Result<(), ConfigError> {
    match path {
        Some(path) => dotenvy::from_path(path)?,
        None => {
            dotenvy::dotenv().ok();
        }
    }
    Ok(())
}
