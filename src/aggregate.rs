//! Aggregation of settled generation calls into a displayable shot set.

use crate::dispatch::GenerationOutcome;
use crate::error::{Result, UgcError};
use crate::image::GeneratedImage;
use std::path::{Path, PathBuf};

/// MIME type shots are labelled with for display and download.
pub const SHOT_MIME_TYPE: &str = "image/jpeg";

/// A successfully generated shot, numbered among the successful results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedShot {
    /// 1-based position among the successful results.
    pub number: usize,
    /// Index of the prompt variation that produced it.
    pub prompt_index: usize,
    /// The generated image.
    pub image: GeneratedImage,
}

impl GeneratedShot {
    /// Download filename, e.g. `ugc-food-shot-1.jpeg`.
    pub fn filename(&self) -> String {
        format!("ugc-food-shot-{}.jpeg", self.number)
    }

    /// A `data:` URL for displaying the shot.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", SHOT_MIME_TYPE, self.image.to_base64())
    }

    /// Writes the shot into `dir` under its download filename.
    pub fn save_in(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(self.filename());
        std::fs::write(&path, &self.image.data)?;
        Ok(path)
    }
}

/// The shots that survived a generation batch. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotSet {
    shots: Vec<GeneratedShot>,
    requested: usize,
}

impl ShotSet {
    /// The shots, in prompt order.
    pub fn shots(&self) -> &[GeneratedShot] {
        &self.shots
    }

    /// Number of shots.
    pub fn len(&self) -> usize {
        self.shots.len()
    }

    /// Always false; an empty batch is an error, not a set.
    pub fn is_empty(&self) -> bool {
        self.shots.is_empty()
    }

    /// How many calls the batch made.
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// True if some calls did not produce an image.
    pub fn is_partial(&self) -> bool {
        self.shots.len() < self.requested
    }

    /// Saves every shot into `dir`, creating it if needed.
    pub fn save_all(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        self.shots.iter().map(|shot| shot.save_in(dir)).collect()
    }
}

impl IntoIterator for ShotSet {
    type Item = GeneratedShot;
    type IntoIter = std::vec::IntoIter<GeneratedShot>;

    fn into_iter(self) -> Self::IntoIter {
        self.shots.into_iter()
    }
}

/// Keeps the successful images of a batch.
///
/// Lost calls are logged. If nothing succeeded the batch is a total failure,
/// reported as the first fatal call error (a rejected key, a bad request)
/// when there is one, and as [`UgcError::NoImagesReturned`] otherwise.
pub fn aggregate(outcomes: Vec<GenerationOutcome>) -> Result<ShotSet> {
    let requested = outcomes.len();
    let mut shots = Vec::with_capacity(requested);
    let mut fatal = None;

    for (prompt_index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            GenerationOutcome::Image(image) => shots.push(GeneratedShot {
                number: shots.len() + 1,
                prompt_index,
                image,
            }),
            GenerationOutcome::Empty => {
                tracing::warn!(prompt_index, "generation returned no image");
            }
            GenerationOutcome::Failed(e) => {
                tracing::warn!(prompt_index, "generation failed: {e}");
                if fatal.is_none() && e.is_fatal() {
                    fatal = Some(e);
                }
            }
        }
    }

    if shots.is_empty() {
        return Err(fatal.unwrap_or(UgcError::NoImagesReturned));
    }
    if shots.len() < requested {
        tracing::warn!(
            succeeded = shots.len(),
            requested,
            "some images could not be generated"
        );
    }

    Ok(ShotSet { shots, requested })
}
