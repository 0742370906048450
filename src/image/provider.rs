//! Image provider trait.

use crate::error::Result;
use crate::image::types::{GeneratedImage, GenerationRequest};
use async_trait::async_trait;

/// Trait for image generation backends.
///
/// Implementations are built once and handed to the dispatcher by reference.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generates an image for the given request.
    ///
    /// Returns `Ok(None)` when the backend answered successfully but the
    /// response carried no image.
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<Option<GeneratedImage>>;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str;
}
