//! Satellite tile download from the Mapbox Static Images API.
//!
//! ```text
//! GET {base_url}/styles/v1/{style}/static/{lon},{lat},{zoom},{bearing},{pitch}/{size}?access_token=…
//! ```
//!
//! The token is part of the query string, so every URL that reaches a log
//! line goes through [`redact_token`] first. Transport errors are stripped
//! of their URL before they leave [`MapboxClient::fetch`].

use crate::config::{MapConfig, Secret};
use crate::dataset::CityRecord;
use reqwest::blocking::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Map request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Map request returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Anything that can produce the raw image bytes for a city.
pub trait MapSource {
    fn fetch(&self, city: &CityRecord) -> Result<Vec<u8>, FetchError>;
}

/// Build the static image URL for `city`.
pub fn static_image_url(config: &MapConfig, city: &CityRecord, token: &str) -> String {
    format!(
        "{}/styles/v1/{}/static/{},{},{},{},{}/{}?access_token={}",
        config.base_url.trim_end_matches('/'),
        config.style,
        city.longitude,
        city.latitude,
        config.zoom,
        config.bearing,
        config.pitch,
        config.size,
        urlencoding::encode(token),
    )
}

/// Replace the `access_token` query value with `***`.
pub fn redact_token(url: &str) -> String {
    match url.split_once("access_token=") {
        Some((head, tail)) => {
            let rest = tail.find('&').map(|i| &tail[i..]).unwrap_or("");
            format!("{head}access_token=***{rest}")
        }
        None => url.to_string(),
    }
}

/// `reqwest` errors print the request URL, token included.
fn without_url(e: reqwest::Error) -> FetchError {
    FetchError::Http(e.without_url())
}

/// Blocking Mapbox client with a bounded download time.
pub struct MapboxClient {
    client: Client,
    config: MapConfig,
    token: Secret,
}

impl MapboxClient {
    pub fn new(config: MapConfig, token: Secret) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config,
            token,
        })
    }
}

impl MapSource for MapboxClient {
    fn fetch(&self, city: &CityRecord) -> Result<Vec<u8>, FetchError> {
        let url = static_image_url(&self.config, city, self.token.expose());
        info!(url = %redact_token(&url), "Requesting satellite image");

        let response = self.client.get(&url).send().map_err(without_url)?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().map_err(without_url)?;
        debug!(bytes = bytes.len(), "Satellite image downloaded");
        Ok(bytes.to_vec())
    }
}
