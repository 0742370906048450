//! Image upload, request and provider types.

mod provider;
pub mod providers;
mod types;

pub use provider::ImageProvider;
pub use types::{GeneratedImage, GenerationMetadata, GenerationRequest, ImageFormat, UploadedImage};
