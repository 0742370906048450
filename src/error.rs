//! Error types for UGC shot generation.

use std::time::Duration;

/// Maximum number of characters of an API error body kept in messages.
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Errors that can occur while preparing, generating or saving UGC shots.
#[derive(Debug, thiserror::Error)]
pub enum UgcError {
    /// Generation was triggered without a food image.
    #[error("Please upload a food image first.")]
    MissingFoodImage,

    /// Every generation call in the batch failed or came back empty.
    #[error("The API did not return any images. Please try again.")]
    NoImagesReturned,

    /// API key missing or rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limit exceeded. Not retried; the hint is informational.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Uploaded file is not a PNG, JPEG or WebP image.
    #[error("unsupported image type: {0}")]
    UnsupportedImageType(String),

    /// The API answered in a shape we could not use.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., reading an upload or saving a shot).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl UgcError {
    /// Returns true if this error means the batch cannot be attempted at all,
    /// as opposed to a single call going wrong.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingFoodImage
                | Self::Auth(_)
                | Self::InvalidRequest(_)
                | Self::UnsupportedImageType(_)
        )
    }

    /// Renders the single message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingFoodImage => self.to_string(),
            other => format!("An error occurred: {}", other),
        }
    }
}

/// Trims an API error body down to something fit for a one-line message.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let text = text.trim();
    let message = serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| text.to_string());

    if message.chars().count() > MAX_ERROR_BODY_CHARS {
        let truncated: String = message.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{}...", truncated)
    } else {
        message
    }
}

/// Reads a `Retry-After` header given in whole seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Result type alias for UGC shot operations.
pub type Result<T> = std::result::Result<T, UgcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_fatal() {
        assert!(UgcError::MissingFoodImage.is_fatal());
        assert!(UgcError::Auth("no key".into()).is_fatal());
        assert!(UgcError::UnsupportedImageType("image/gif".into()).is_fatal());

        assert!(!UgcError::NoImagesReturned.is_fatal());
        assert!(!UgcError::RateLimited { retry_after: None }.is_fatal());
        assert!(!UgcError::ContentBlocked("nsfw".into()).is_fatal());
    }

    #[test]
    fn test_user_message() {
        assert_eq!(
            UgcError::MissingFoodImage.user_message(),
            "Please upload a food image first."
        );
        assert_eq!(
            UgcError::NoImagesReturned.user_message(),
            "An error occurred: The API did not return any images. Please try again."
        );
        assert_eq!(
            UgcError::Auth("API_KEY environment variable not found".into()).user_message(),
            "An error occurred: authentication failed: API_KEY environment variable not found"
        );
    }

    #[test]
    fn test_error_display() {
        let err = UgcError::Api {
            status: 500,
            message: "Internal".into(),
        };
        assert_eq!(err.to_string(), "API error: 500 - Internal");
    }

    #[test]
    fn test_sanitize_extracts_google_error_message() {
        let body = r#"{"error":{"code":400,"message":"Image too large","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(sanitize_error_message(body), "Image too large");
    }

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(1000);
        let msg = sanitize_error_message(&body);
        assert_eq!(msg.chars().count(), MAX_ERROR_BODY_CHARS + 3);
        assert!(msg.ends_with("..."));
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = reqwest::header::HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(reqwest::header::RETRY_AFTER, "30".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), Some(30));
    }
}
