//! X/Twitter implementation of [`SocialApi`].
//!
//! Media goes through the v1.1 upload endpoint (multipart field `media`),
//! posts through v2 `/2/tweets`. Both requests carry an OAuth 1.0a user
//! context header built from the four user keys.

use crate::config::{PostConfig, TwitterCredentials};
use crate::oauth::{Nonce, authorization_header};
use crate::publish::{MediaId, NewPost, PostId, SocialApi, SocialError};
use reqwest::blocking::{Client, RequestBuilder, multipart};
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const UPLOAD_PATH: &str = "/1.1/media/upload.json";
const CREATE_POST_PATH: &str = "/2/tweets";

pub struct TwitterClient {
    client: Client,
    credentials: TwitterCredentials,
    api_base: String,
    upload_base: String,
}

#[derive(Debug, Deserialize)]
struct MediaUploadResponse {
    media_id_string: String,
}

#[derive(Debug, Deserialize)]
struct CreatePostResponse {
    data: CreatedPost,
}

#[derive(Debug, Deserialize)]
struct CreatedPost {
    id: String,
}

/// JSON body of `POST /2/tweets`.
#[derive(Debug, Serialize)]
pub struct CreatePostBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    media: MediaIds<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<ReplyTo<'a>>,
}

#[derive(Debug, Serialize)]
struct MediaIds<'a> {
    media_ids: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct ReplyTo<'a> {
    in_reply_to_tweet_id: &'a str,
}

impl<'a> From<&'a NewPost> for CreatePostBody<'a> {
    fn from(post: &'a NewPost) -> Self {
        Self {
            text: post.text.as_deref(),
            media: MediaIds {
                media_ids: post.media_ids.iter().map(|m| m.0.as_str()).collect(),
            },
            reply: post.in_reply_to.as_ref().map(|id| ReplyTo {
                in_reply_to_tweet_id: id.0.as_str(),
            }),
        }
    }
}

impl TwitterClient {
    pub fn new(config: &PostConfig, credentials: TwitterCredentials) -> Result<Self, SocialError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            credentials,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            upload_base: config.upload_base.trim_end_matches('/').to_string(),
        })
    }

    /// Start a signed POST to `url`.
    fn signed_post(&self, url: &str) -> Result<RequestBuilder, SocialError> {
        let header = authorization_header(&self.credentials, "POST", url, &[], &Nonce::generate())
            .map_err(SocialError::Signing)?;
        Ok(self.client.post(url).header(AUTHORIZATION, header))
    }

    /// Send the request and decode a 2xx JSON body.
    fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, SocialError> {
        let response = request.send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(SocialError::Status {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|e| SocialError::Response(format!("{e}: {body}")))
    }
}

impl SocialApi for TwitterClient {
    fn upload_media(&self, bytes: &[u8], mime: &str) -> Result<MediaId, SocialError> {
        let url = format!("{}{UPLOAD_PATH}", self.upload_base);
        let part = multipart::Part::bytes(bytes.to_vec())
            .file_name("image.jpg")
            .mime_str(mime)?;
        let form = multipart::Form::new().part("media", part);

        debug!(bytes = bytes.len(), "Uploading media");
        let response: MediaUploadResponse = Self::send(self.signed_post(&url)?.multipart(form))?;
        Ok(MediaId(response.media_id_string))
    }

    fn create_post(&self, post: &NewPost) -> Result<PostId, SocialError> {
        let url = format!("{}{CREATE_POST_PATH}", self.api_base);
        let body = CreatePostBody::from(post);

        debug!(reply = post.in_reply_to.is_some(), "Creating post");
        let response: CreatePostResponse = Self::send(self.signed_post(&url)?.json(&body))?;
        Ok(PostId(response.data.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn primary_post_body_has_text_and_media() {
        let post = NewPost {
            text: Some("📍 Springfield, Illinois".into()),
            media_ids: vec![MediaId("111".into())],
            in_reply_to: None,
        };
        let body = serde_json::to_value(CreatePostBody::from(&post)).unwrap();
        assert_eq!(
            body,
            json!({
                "text": "📍 Springfield, Illinois",
                "media": { "media_ids": ["111"] }
            })
        );
    }

    #[test]
    fn reply_body_has_no_text() {
        let post = NewPost {
            text: None,
            media_ids: vec![MediaId("222".into())],
            in_reply_to: Some(PostId("999".into())),
        };
        let body = serde_json::to_value(CreatePostBody::from(&post)).unwrap();
        assert_eq!(
            body,
            json!({
                "media": { "media_ids": ["222"] },
                "reply": { "in_reply_to_tweet_id": "999" }
            })
        );
    }

    #[test]
    fn upload_response_reads_string_id() {
        let parsed: MediaUploadResponse = serde_json::from_str(
            r#"{"media_id": 710511363345354753, "media_id_string": "710511363345354753", "size": 11065}"#,
        )
        .unwrap();
        assert_eq!(parsed.media_id_string, "710511363345354753");
    }

    #[test]
    fn create_response_reads_data_id() {
        let parsed: CreatePostResponse = serde_json::from_str(
            r#"{"data": {"id": "1445880548472328192", "text": "hello"}}"#,
        )
        .unwrap();
        assert_eq!(parsed.data.id, "1445880548472328192");
    }

    #[test]
    fn client_trims_trailing_slashes() {
        let config = PostConfig {
            api_base: "http://localhost:9000/".into(),
            ..PostConfig::default()
        };
        let credentials = TwitterCredentials {
            api_key: crate::config::Secret::new("k"),
            api_key_secret: crate::config::Secret::new("ks"),
            access_token: crate::config::Secret::new("t"),
            access_token_secret: crate::config::Secret::new("ts"),
            bearer_token: crate::config::Secret::new("b"),
        };
        let client = TwitterClient::new(&config, credentials).unwrap();
        assert_eq!(client.api_base, "http://localhost:9000");
        assert_eq!(client.upload_base, "https://upload.twitter.com");
    }
}
