//! OAuth 1.0a request signing (HMAC-SHA1, user context).
//!
//! Only the `oauth_*` parameters and any query/form parameters passed in
//! take part in the signature. JSON and multipart bodies are not signed.

use crate::config::TwitterCredentials;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use rand::Rng;
use rand::distr::Alphanumeric;
use sha1::Sha1;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const VERSION: &str = "1.0";

/// RFC 3986 percent-encoding: everything but `A-Z a-z 0-9 - . _ ~`.
fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Per-request values that are random or time-dependent.
#[derive(Debug, Clone)]
pub struct Nonce {
    pub nonce: String,
    pub timestamp: u64,
}

impl Nonce {
    pub fn generate() -> Self {
        let nonce = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self { nonce, timestamp }
    }
}

/// `METHOD&url&params`, each part percent-encoded, params sorted.
pub fn signature_base_string(method: &str, url: &str, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    encoded.sort();
    let joined = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(url),
        encode(&joined)
    )
}

/// Base64 HMAC-SHA1 of the base string, keyed with both secrets.
pub fn signature(
    method: &str,
    url: &str,
    params: &[(String, String)],
    consumer_secret: &str,
    token_secret: &str,
) -> Result<String, String> {
    let key = format!("{}&{}", encode(consumer_secret), encode(token_secret));
    let mut mac = HmacSha1::new_from_slice(key.as_bytes()).map_err(|e| e.to_string())?;
    mac.update(signature_base_string(method, url, params).as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Build the `Authorization` header value for one request.
///
/// `extra_params` are query or form parameters that travel with the request.
pub fn authorization_header(
    credentials: &TwitterCredentials,
    method: &str,
    url: &str,
    extra_params: &[(&str, &str)],
    nonce: &Nonce,
) -> Result<String, String> {
    let timestamp = nonce.timestamp.to_string();
    let mut oauth_params: Vec<(String, String)> = vec![
        ("oauth_consumer_key".into(), credentials.api_key.expose().into()),
        ("oauth_nonce".into(), nonce.nonce.clone()),
        ("oauth_signature_method".into(), SIGNATURE_METHOD.into()),
        ("oauth_timestamp".into(), timestamp),
        ("oauth_token".into(), credentials.access_token.expose().into()),
        ("oauth_version".into(), VERSION.into()),
    ];

    let mut signed = oauth_params.clone();
    signed.extend(
        extra_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string())),
    );
    let sig = signature(
        method,
        url,
        &signed,
        credentials.api_key_secret.expose(),
        credentials.access_token_secret.expose(),
    )?;

    oauth_params.push(("oauth_signature".into(), sig));
    oauth_params.sort();
    let fields = oauth_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("OAuth {fields}"))
}
