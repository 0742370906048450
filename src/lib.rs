#![warn(missing_docs)]
//! ugcshot - UGC-style food photos from a single product shot.
//!
//! Give it a food photo (and optionally a photo of a person) and it asks
//! Gemini for three casual, "user-generated-content" style marketing shots
//! combining the two, one per fixed shot variation.
//!
//! # Quick Start
//!
//! ```no_run
//! use ugcshot::{GeminiProvider, Session, UploadedImage};
//!
//! #[tokio::main]
//! async fn main() -> ugcshot::Result<()> {
//!     let provider = GeminiProvider::builder().build()?;
//!
//!     let mut session = Session::new();
//!     session.upload_food(UploadedImage::from_path("pizza.jpg")?);
//!     session.generate(&provider).await;
//!
//!     match (session.shots(), session.error_message()) {
//!         (Some(shots), _) => {
//!             shots.save_all("out")?;
//!         }
//!         (None, Some(message)) => eprintln!("{message}"),
//!         (None, None) => unreachable!("a settled session has shots or an error"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Pieces
//!
//! - [`prompt`]: the two base templates and three shot variations.
//! - [`dispatch`]: one concurrent provider call per prompt, all settled.
//! - [`aggregate`]: keeps the successful images, numbered for download.
//! - [`session`]: idle / generating / success / failure state.
//!
//! # Features
//!
//! - `gemini`: the Gemini (Google) provider (default).
//! - `cli`: the `ugcshot` command-line interface (default).

mod error;

pub mod aggregate;
pub mod dispatch;
pub mod image;
pub mod prompt;
pub mod session;

// Re-export error types at crate root
pub use error::{Result, UgcError};

pub use aggregate::{aggregate, GeneratedShot, ShotSet};
pub use dispatch::{dispatch, dispatch_shots, generate_single, GenerationOutcome};
pub use image::{
    GeneratedImage, GenerationMetadata, GenerationRequest, ImageFormat, ImageProvider,
    UploadedImage,
};
pub use prompt::assemble_prompts;
pub use session::{GenerationTicket, Session, SessionState};

#[cfg(feature = "gemini")]
pub use image::providers::{GeminiModel, GeminiProvider, GeminiProviderBuilder};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{Result, UgcError};
    pub use crate::image::{ImageProvider, UploadedImage};
    pub use crate::session::{Session, SessionState};

    #[cfg(feature = "gemini")]
    pub use crate::image::providers::GeminiProvider;
}
