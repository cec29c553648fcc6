//! Posting a derived image pair: a captioned primary post and a threaded
//! zoom reply.
//!
//! ```text
//! upload primary ─ create post (caption) ─ upload zoom ─ create reply (no text)
//! ```
//!
//! Each step can fail independently. A failure after the primary post exists
//! leaves that post standing; [`PublishError::primary_post_id`] reports it so
//! the operator can clean up or reply by hand.

use crate::dataset::CityRecord;
use crate::imaging::EncodedImage;
use std::fmt;
use thiserror::Error;
use tracing::info;

pub const JPEG_MIME: &str = "image/jpeg";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaId(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostId(pub String);

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A post to create. `text` is omitted for image-only replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub text: Option<String>,
    pub media_ids: Vec<MediaId>,
    pub in_reply_to: Option<PostId>,
}

#[derive(Error, Debug)]
pub enum SocialError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Unexpected API response: {0}")]
    Response(String),
    #[error("Cannot sign request: {0}")]
    Signing(String),
}

/// The two calls the publisher needs from a social network.
pub trait SocialApi {
    fn upload_media(&self, bytes: &[u8], mime: &str) -> Result<MediaId, SocialError>;
    fn create_post(&self, post: &NewPost) -> Result<PostId, SocialError>;
}

/// Which step of the publish sequence failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStep {
    UploadPrimary,
    CreatePost,
    UploadZoom,
    CreateReply,
}

impl fmt::Display for PublishStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PublishStep::UploadPrimary => "primary media upload",
            PublishStep::CreatePost => "primary post",
            PublishStep::UploadZoom => "zoom media upload",
            PublishStep::CreateReply => "zoom reply",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
#[error("Publishing failed at {step}: {source}")]
pub struct PublishError {
    pub step: PublishStep,
    /// Set when the primary post was created before the failure.
    pub primary_post_id: Option<PostId>,
    #[source]
    pub source: SocialError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub primary_post_id: PostId,
    pub reply_post_id: PostId,
}

/// `"<name>, <county> County, <state>"`, or `"<name>, <state>"` without a county.
pub fn caption(city: &CityRecord) -> String {
    match city.county() {
        Some(county) => format!("{}, {} County, {}", city.name, county, city.state),
        None => format!("{}, {}", city.name, city.state),
    }
}

/// Caption with the configured prefix, as it appears in the post.
pub fn post_text(prefix: &str, city: &CityRecord) -> String {
    format!("{prefix}{}", caption(city))
}

fn fail(
    step: PublishStep,
    primary_post_id: Option<&PostId>,
) -> impl FnOnce(SocialError) -> PublishError + '_ {
    move |source| PublishError {
        step,
        primary_post_id: primary_post_id.cloned(),
        source,
    }
}

/// Post `primary` with `text`, then reply to it with `zoom`.
pub fn publish<S: SocialApi + ?Sized>(
    api: &S,
    primary: &EncodedImage,
    zoom: &EncodedImage,
    text: &str,
) -> Result<Published, PublishError> {
    let primary_media = api
        .upload_media(&primary.bytes, JPEG_MIME)
        .map_err(fail(PublishStep::UploadPrimary, None))?;
    let primary_post_id = api
        .create_post(&NewPost {
            text: Some(text.to_string()),
            media_ids: vec![primary_media],
            in_reply_to: None,
        })
        .map_err(fail(PublishStep::CreatePost, None))?;
    info!(post_id = %primary_post_id, "Primary post created");

    let zoom_media = api
        .upload_media(&zoom.bytes, JPEG_MIME)
        .map_err(fail(PublishStep::UploadZoom, Some(&primary_post_id)))?;
    let reply_post_id = api
        .create_post(&NewPost {
            text: None,
            media_ids: vec![zoom_media],
            in_reply_to: Some(primary_post_id.clone()),
        })
        .map_err(fail(PublishStep::CreateReply, Some(&primary_post_id)))?;
    info!(post_id = %reply_post_id, "Zoom reply created");

    Ok(Published {
        primary_post_id,
        reply_post_id,
    })
}
