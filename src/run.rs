//! One bot run, start to finish.
//!
//! ```text
//! load used ─ pick ─ fetch ─ derive ─ [save] ─ mark used ─ publish
//! ```
//!
//! The id is marked used only after both images exist, and before anything
//! is posted. A publish failure therefore still consumes the city: the next
//! run picks a different one rather than risking a second, duplicate post.
//! Every step before marking is side-effect free, so an exhausted dataset,
//! a failed download, an undecodable tile or an unwritable save directory
//! leave the used-id file as it was.

use crate::dataset::{CityId, CityRecord};
use crate::imaging::{DerivedPair, ImageError, PipelineParams, derive_pair};
use crate::map::{FetchError, MapSource};
use crate::publish::{PublishError, Published, SocialApi, post_text, publish};
use crate::selection::{SelectionError, StoreError, UsedIdStore, pick, remaining};
use rand::Rng;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum RunError {
    #[error("{0}")]
    DatasetExhausted(#[from] SelectionError),
    #[error("Fetching the satellite image for city {city} failed: {source}")]
    Fetch { city: CityId, source: FetchError },
    #[error("Image processing failed: {0}")]
    Image(#[from] ImageError),
    #[error("Saving images to {dir} failed: {source}")]
    Save { dir: PathBuf, source: ImageError },
    #[error("Used-id store error: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Run-level settings that do not come from the collaborators.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub params: PipelineParams,
    pub caption_prefix: String,
    /// Also write `primary.jpg` and `zoom.jpg` here.
    pub save_dir: Option<PathBuf>,
}

/// What a finished run did.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub city: CityRecord,
    pub text: String,
    pub images: DerivedPair,
    /// Candidates still unused after this run.
    pub remaining: usize,
    pub saved: Option<(PathBuf, PathBuf)>,
    /// `None` when no social client was given (dry run).
    pub published: Option<Published>,
}

/// Pick, fetch, derive, mark and (when `social` is given) publish one city.
pub fn run_once<R: Rng>(
    candidates: &[CityRecord],
    store: &dyn UsedIdStore,
    map: &dyn MapSource,
    social: Option<&dyn SocialApi>,
    options: &RunOptions,
    rng: &mut R,
) -> Result<RunReport, RunError> {
    let mut used = store.load()?;
    let city = pick(candidates, &used, rng)?.clone();
    info!(
        id = city.id,
        name = %city.name,
        state = %city.state,
        remaining = remaining(candidates, &used),
        "Selected city"
    );

    let raw = map.fetch(&city).map_err(|source| RunError::Fetch {
        city: city.id,
        source,
    })?;
    info!(bytes = raw.len(), "Fetched satellite image");

    let images = derive_pair(&raw, &options.params)?;
    info!(
        primary = images.primary.bytes.len(),
        zoom = images.zoom.bytes.len(),
        size = options.params.target_size,
        "Derived primary and zoom images"
    );

    let saved = match &options.save_dir {
        Some(dir) => {
            let paths = images.save_to(dir).map_err(|source| RunError::Save {
                dir: dir.clone(),
                source,
            })?;
            info!(dir = %dir.display(), "Saved images");
            Some(paths)
        }
        None => None,
    };

    store.append(city.id)?;
    info!(id = city.id, "Marked city as used");

    let text = post_text(&options.caption_prefix, &city);
    let published = match social {
        Some(api) => {
            let published = publish(api, &images.primary, &images.zoom, &text).inspect_err(|e| {
                warn!(
                    id = city.id,
                    step = %e.step,
                    orphan = ?e.primary_post_id,
                    "Publishing failed after the city was marked used"
                )
            })?;
            Some(published)
        }
        None => {
            info!("No social client, skipping publish");
            None
        }
    };

    used.insert(city.id);
    Ok(RunReport {
        remaining: remaining(candidates, &used),
        city,
        text,
        images,
        saved,
        published,
    })
}
