//! # Sat Cities
//!
//! A scheduled bot that posts a satellite view of a random city. Each run
//! picks a city that has never been posted, downloads a Mapbox satellite tile
//! for its coordinates, derives a sharpened primary image plus a closer zoom
//! image, and posts both to X/Twitter as a post and a threaded reply.
//!
//! # Architecture: One Sequential Run
//!
//! ```text
//! cities.csv ─┐
//!             ├─ pick ─ fetch tile ─ derive primary + zoom ─ mark used ─ post ─ reply
//! used.txt ───┘
//! ```
//!
//! Every collaborator with side effects sits behind a trait
//! ([`selection::UsedIdStore`], [`map::MapSource`], [`publish::SocialApi`]),
//! so [`run::run_once`] is exercised end-to-end in tests with in-memory fakes
//! and synthetic tiles.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`dataset`] | Loads candidate cities from CSV |
//! | [`selection`] | Used-id persistence and uniform random choice among unused cities |
//! | [`map`] | Mapbox Static Images URL building and download |
//! | [`imaging`] | Pure-Rust derivation of the primary and zoom JPEGs |
//! | [`publish`] | Caption text and the post + reply sequence over [`publish::SocialApi`] |
//! | [`oauth`] | OAuth 1.0a HMAC-SHA1 request signing |
//! | [`twitter`] | X/Twitter HTTP implementation of [`publish::SocialApi`] |
//! | [`run`] | The run sequence and its error type |
//! | [`config`] | `bot.toml` loading, merging and validation; credentials from the environment |
//! | [`output`] | CLI output formatting for run, check and preview |
//!
//! # Design Decisions
//!
//! ## Mark Before Posting
//!
//! A city is appended to `used.txt` once its images exist and before the
//! first API call to X. If posting fails the city is gone for good. The
//! alternative, marking after a successful post, can double-post a city
//! when the reply fails and the run is retried.
//!
//! ## In-Memory Images
//!
//! Derived JPEGs never touch the disk unless asked (`run --save-dir`,
//! `preview`). A scheduled job leaves nothing behind but the used-id file.
//!
//! ## Secrets Only From the Environment
//!
//! `bot.toml` rejects unknown keys, so a token pasted into it is an error
//! rather than a silently committed secret. Credentials come from the
//! process environment or a `.env` file.

pub mod config;
pub mod dataset;
pub mod imaging;
pub mod map;
pub mod oauth;
pub mod output;
pub mod publish;
pub mod run;
pub mod selection;
pub mod twitter;

#[cfg(test)]
pub(crate) mod test_helpers;
