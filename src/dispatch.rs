//! Concurrent dispatch of one generation call per prompt.

use crate::error::{Result, UgcError};
use crate::image::{GeneratedImage, GenerationRequest, ImageProvider, UploadedImage};
use crate::prompt::assemble_prompts;
use futures::future::join_all;

/// How a single generation call settled.
#[derive(Debug)]
pub enum GenerationOutcome {
    /// The API returned an image.
    Image(GeneratedImage),
    /// The API answered without an image part.
    Empty,
    /// The call failed.
    Failed(UgcError),
}

impl GenerationOutcome {
    /// Returns true if this outcome carries an image.
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image(_))
    }
}

impl From<Result<Option<GeneratedImage>>> for GenerationOutcome {
    fn from(result: Result<Option<GeneratedImage>>) -> Self {
        match result {
            Ok(Some(image)) => Self::Image(image),
            Ok(None) => Self::Empty,
            Err(e) => Self::Failed(e),
        }
    }
}

/// Asks the provider for one image conditioned on the food photo, the
/// optional person photo and the prompt.
pub async fn generate_single<P>(
    provider: &P,
    food: &UploadedImage,
    person: Option<&UploadedImage>,
    prompt: &str,
) -> Result<Option<GeneratedImage>>
where
    P: ImageProvider + ?Sized,
{
    let request = GenerationRequest::new(prompt, food, person);
    provider.generate(&request).await
}

/// Runs one generation call per prompt, all in flight together, and waits
/// for every call to settle.
///
/// Outcomes are returned in prompt order. A failing call never affects its
/// siblings. Only a missing food photo or an empty prompt list fails the
/// whole batch, before anything is sent.
pub async fn dispatch<P>(
    provider: &P,
    food: Option<&UploadedImage>,
    person: Option<&UploadedImage>,
    prompts: &[String],
) -> Result<Vec<GenerationOutcome>>
where
    P: ImageProvider + ?Sized,
{
    let food = food.ok_or(UgcError::MissingFoodImage)?;
    if prompts.is_empty() {
        return Err(UgcError::InvalidRequest("no prompts to generate".into()));
    }

    tracing::debug!(
        provider = provider.name(),
        calls = prompts.len(),
        with_person = person.is_some(),
        "dispatching generation batch"
    );

    let calls = prompts.iter().enumerate().map(move |(index, prompt)| async move {
        let result = generate_single(provider, food, person, prompt).await;
        match &result {
            Ok(Some(image)) => tracing::debug!(
                prompt_index = index,
                size_bytes = image.size(),
                duration_ms = image.metadata.duration_ms,
                "generation call returned an image"
            ),
            Ok(None) => tracing::debug!(prompt_index = index, "generation call returned no image"),
            Err(e) => tracing::debug!(prompt_index = index, "generation call failed: {e}"),
        }
        GenerationOutcome::from(result)
    });

    Ok(join_all(calls).await)
}

/// Assembles the prompts for the given photos and dispatches them.
pub async fn dispatch_shots<P>(
    provider: &P,
    food: Option<&UploadedImage>,
    person: Option<&UploadedImage>,
) -> Result<Vec<GenerationOutcome>>
where
    P: ImageProvider + ?Sized,
{
    let prompts = assemble_prompts(person.is_some());
    dispatch(provider, food, person, &prompts).await
}
