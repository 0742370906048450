//! Core types for image upload and generation.

use crate::error::{Result, UgcError};
use base64::Engine;
use std::path::Path;

/// Image formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG format (lossless).
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
}

impl ImageFormat {
    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Parses one of the accepted MIME types.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// A user-supplied photo, ready to be sent inline to the generation API.
///
/// Immutable once created; replacing a photo means building a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    data: Vec<u8>,
    format: ImageFormat,
    preview: String,
}

impl UploadedImage {
    /// Creates an upload from raw bytes and the MIME type the file came with.
    ///
    /// Only `image/png`, `image/jpeg` and `image/webp` are accepted.
    pub fn from_bytes(data: Vec<u8>, mime_type: &str) -> Result<Self> {
        let format = ImageFormat::from_mime_type(mime_type)
            .ok_or_else(|| UgcError::UnsupportedImageType(mime_type.to_string()))?;
        Self::with_format(data, format)
    }

    /// Reads an upload from disk.
    ///
    /// The format is detected from the file contents, falling back to the
    /// extension when the header is not recognised.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let format = ImageFormat::from_magic_bytes(&data)
            .or_else(|| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .and_then(ImageFormat::from_extension)
            })
            .ok_or_else(|| UgcError::UnsupportedImageType(path.display().to_string()))?;
        Self::with_format(data, format)
    }

    fn with_format(data: Vec<u8>, format: ImageFormat) -> Result<Self> {
        if data.is_empty() {
            return Err(UgcError::InvalidRequest("image file is empty".into()));
        }
        let preview = format!(
            "data:{};base64,{}",
            format.mime_type(),
            base64::engine::general_purpose::STANDARD.encode(&data)
        );
        Ok(Self {
            data,
            format,
            preview,
        })
    }

    /// Raw image bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Detected image format.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// MIME type sent alongside the inline payload.
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// A `data:` URL suitable for displaying the upload.
    pub fn preview(&self) -> &str {
        &self.preview
    }

    /// The base64 payload sent to the API (the preview without its prefix).
    pub fn base64(&self) -> &str {
        self.preview
            .split_once(',')
            .map(|(_, payload)| payload)
            .unwrap_or_default()
    }
}

/// A request for one generated image: the photos to condition on plus a prompt.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    /// Full prompt text.
    pub prompt: String,
    /// The food photo. Always sent first.
    pub food: &'a UploadedImage,
    /// The optional person photo. Sent after the food photo.
    pub person: Option<&'a UploadedImage>,
}

impl<'a> GenerationRequest<'a> {
    /// Creates a new request.
    pub fn new(
        prompt: impl Into<String>,
        food: &'a UploadedImage,
        person: Option<&'a UploadedImage>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            food,
            person,
        }
    }

    /// The inline images in the order they are sent.
    pub fn images(&self) -> impl Iterator<Item = &'a UploadedImage> {
        std::iter::once(self.food).chain(self.person)
    }
}

/// Metadata about one generation call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationMetadata {
    /// Model used for generation.
    pub model: Option<String>,
    /// Generation duration in milliseconds.
    pub duration_ms: Option<u64>,
}

/// An image returned by the generation API.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "generated image should be saved or processed"]
pub struct GeneratedImage {
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// MIME type reported by the API.
    pub mime_type: String,
    /// Generation metadata.
    pub metadata: GenerationMetadata,
}

impl GeneratedImage {
    /// Creates a new generated image.
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>, metadata: GenerationMetadata) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
            metadata,
        }
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Encodes the image data as base64.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}
