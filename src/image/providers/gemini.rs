//! Gemini (Google) image generation provider.

use crate::error::{parse_retry_after, sanitize_error_message, Result, UgcError};
use crate::image::provider::ImageProvider;
use crate::image::types::{GeneratedImage, GenerationMetadata, GenerationRequest};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Environment variables consulted for the API key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GOOGLE_API_KEY", "API_KEY"];

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Nano Banana - Gemini 2.5 Flash Image (fast, economical).
    #[default]
    NanoBanana,
    /// Nano Banana Pro (highest quality).
    NanoBananaPro,
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NanoBanana => "gemini-2.5-flash-image",
            Self::NanoBananaPro => "nano-banana-pro-preview",
        }
    }
}

/// Builder for GeminiProvider.
#[derive(Debug, Clone, Default)]
pub struct GeminiProviderBuilder {
    api_key: Option<String>,
    model: GeminiModel,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl GeminiProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `GOOGLE_API_KEY`, then `API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Overrides the API endpoint (proxies, tests).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets a per-request timeout. By default the HTTP client's own
    /// behaviour applies.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the provider, resolving the API key.
    pub fn build(self) -> Result<GeminiProvider> {
        let api_key = resolve_api_key(self.api_key, |name| std::env::var(name).ok())?;

        let mut client = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            client = client.timeout(timeout);
        }

        Ok(GeminiProvider {
            client: client.build()?,
            api_key,
            model: self.model,
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

fn resolve_api_key(
    explicit: Option<String>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String> {
    explicit
        .into_iter()
        .chain(API_KEY_ENV_VARS.into_iter().filter_map(|name| lookup(name)))
        .find(|key| !key.trim().is_empty())
        .ok_or_else(|| {
            UgcError::Auth("GOOGLE_API_KEY (or API_KEY) not set and no API key provided".into())
        })
}

/// Gemini image generation provider.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: GeminiModel,
    base_url: String,
}

impl GeminiProvider {
    /// Creates a new `GeminiProviderBuilder`.
    pub fn builder() -> GeminiProviderBuilder {
        GeminiProviderBuilder::new()
    }

    /// The model this provider calls.
    pub fn model(&self) -> GeminiModel {
        self.model
    }

    async fn generate_impl(&self, request: &GenerationRequest<'_>) -> Result<Option<GeneratedImage>> {
        let start = Instant::now();

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url,
            self.model.as_str(),
        );

        let body = GeminiRequest::from_generation_request(request);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text, &headers));
        }

        let text = response.text().await?;
        let gemini_response: GeminiResponse = serde_json::from_str(&text).map_err(|e| {
            UgcError::UnexpectedResponse(format!("malformed Gemini response: {}", e))
        })?;

        let Some(inline_data) = gemini_response.into_first_image()? else {
            return Ok(None);
        };

        let data = base64::engine::general_purpose::STANDARD
            .decode(inline_data.data.trim())
            .map_err(|e| UgcError::Decode(e.to_string()))?;

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(
            model = self.model.as_str(),
            duration_ms,
            size_bytes = data.len(),
            "Gemini returned an image"
        );

        Ok(Some(GeneratedImage::new(
            data,
            inline_data.mime_type,
            GenerationMetadata {
                model: Some(self.model.as_str().to_string()),
                duration_ms: Some(duration_ms),
            },
        )))
    }
}

fn parse_error(status: u16, text: &str, headers: &reqwest::header::HeaderMap) -> UgcError {
    let text = sanitize_error_message(text);
    if status == 404 {
        return UgcError::InvalidRequest(
            "Model not found. Verify the model name is correct.".into(),
        );
    }
    if status == 429 {
        let retry_after = parse_retry_after(headers).map(Duration::from_secs);
        return UgcError::RateLimited { retry_after };
    }
    if status == 401 || status == 403 {
        return UgcError::Auth(text);
    }
    let lower = text.to_lowercase();
    if lower.contains("safety") || lower.contains("blocked") || lower.contains("prohibited") {
        return UgcError::ContentBlocked(text);
    }
    UgcError::Api {
        status,
        message: text,
    }
}

#[async_trait]
impl ImageProvider for GeminiProvider {
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<Option<GeneratedImage>> {
        self.generate_impl(request).await
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - can be text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
}

impl GeminiRequest {
    fn from_generation_request(req: &GenerationRequest<'_>) -> Self {
        let mut parts: Vec<GeminiRequestPart> = req
            .images()
            .map(|image| GeminiRequestPart::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type().to_string(),
                    data: image.base64().to_string(),
                },
            })
            .collect();

        parts.push(GeminiRequestPart::Text {
            text: req.prompt.clone(),
        });

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: vec!["IMAGE".to_string()],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

/// A response part. Only inline image data is of use; text and anything
/// else the API adds are skipped.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResponsePart {
    InlineData {
        #[serde(rename = "inlineData", alias = "inline_data")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
    Other(serde::de::IgnoredAny),
}

impl GeminiResponse {
    /// Extracts the first inline image of the first candidate.
    ///
    /// Explicit block signals become `ContentBlocked`; a response that simply
    /// has no image part yields `None`.
    fn into_first_image(self) -> Result<Option<InlineData>> {
        if let Some(feedback) = self.prompt_feedback {
            if let Some(reason) = feedback.block_reason {
                let msg = feedback
                    .block_reason_message
                    .unwrap_or_else(|| format!("Prompt blocked: {}", reason));
                return Err(UgcError::ContentBlocked(msg));
            }
        }

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Ok(None);
        };

        if let Some(ref finish_reason) = candidate.finish_reason {
            match finish_reason.as_str() {
                "SAFETY"
                | "IMAGE_SAFETY"
                | "IMAGE_PROHIBITED_CONTENT"
                | "PROHIBITED_CONTENT"
                | "BLOCKLIST" => {
                    return Err(UgcError::ContentBlocked(format!(
                        "Content blocked by Gemini safety filter: {}",
                        finish_reason
                    )));
                }
                _ => {}
            }
        }

        let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
        for part in parts {
            match part {
                ResponsePart::InlineData { inline_data } => return Ok(Some(inline_data)),
                ResponsePart::Text { text } => {
                    tracing::debug!(text = %text, "Gemini returned a text part");
                }
                ResponsePart::Other(_) => {}
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::types::UploadedImage;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const JPEG_MAGIC: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];
    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash-image:generateContent";

    fn food() -> UploadedImage {
        UploadedImage::from_bytes(JPEG_MAGIC.to_vec(), "image/jpeg").unwrap()
    }

    fn person() -> UploadedImage {
        UploadedImage::from_bytes(PNG_MAGIC.to_vec(), "image/png").unwrap()
    }

    async fn provider_for(server: &MockServer) -> GeminiProvider {
        GeminiProvider::builder()
            .api_key("test-key")
            .base_url(server.uri())
            .build()
            .unwrap()
    }

    #[test]
    fn test_gemini_model_as_str() {
        assert_eq!(GeminiModel::NanoBanana.as_str(), "gemini-2.5-flash-image");
        assert_eq!(
            GeminiModel::NanoBananaPro.as_str(),
            "nano-banana-pro-preview"
        );
        assert_eq!(GeminiModel::default(), GeminiModel::NanoBanana);
    }

    #[test]
    fn test_resolve_api_key_order() {
        let env = |name: &str| match name {
            "GOOGLE_API_KEY" => Some("google".to_string()),
            "API_KEY" => Some("generic".to_string()),
            _ => None,
        };
        assert_eq!(resolve_api_key(Some("explicit".into()), env).unwrap(), "explicit");
        assert_eq!(resolve_api_key(None, env).unwrap(), "google");

        let only_generic = |name: &str| (name == "API_KEY").then(|| "generic".to_string());
        assert_eq!(resolve_api_key(None, only_generic).unwrap(), "generic");
    }

    #[test]
    fn test_resolve_api_key_missing() {
        let err = resolve_api_key(None, |_| None).unwrap_err();
        assert!(matches!(err, UgcError::Auth(_)));
        assert!(err.is_fatal());

        let blank = resolve_api_key(Some("  ".into()), |_| None).unwrap_err();
        assert!(matches!(blank, UgcError::Auth(_)));
    }

    #[test]
    fn test_request_parts_food_person_text() {
        let (food, person) = (food(), person());
        let req = GenerationRequest::new("Make it tasty", &food, Some(&person));
        let json = serde_json::to_value(GeminiRequest::from_generation_request(&req)).unwrap();

        let parts = json["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[0]["inlineData"]["data"], food.base64());
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[2]["text"], "Make it tasty");
        assert_eq!(
            json["generationConfig"]["responseModalities"],
            serde_json::json!(["IMAGE"])
        );
    }

    #[test]
    fn test_request_without_person_has_two_parts() {
        let food = food();
        let req = GenerationRequest::new("Make it tasty", &food, None);
        let gemini_req = GeminiRequest::from_generation_request(&req);
        assert_eq!(gemini_req.contents[0].parts.len(), 2);
    }

    #[test]
    fn test_first_image_wins() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "Here you go"},
                        {"inlineData": {"mimeType": "image/png", "data": "Zmlyc3Q="}},
                        {"inlineData": {"mimeType": "image/png", "data": "c2Vjb25k"}}
                    ]
                },
                "finishReason": "STOP"
            }]
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        let image = resp.into_first_image().unwrap().unwrap();
        assert_eq!(image.data, "Zmlyc3Q=");
    }

    #[test]
    fn test_text_only_response_yields_none() {
        let json = r#"{"candidates": [{"content": {"parts": [{"text": "no"}, {}]}}]}"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        assert!(resp.into_first_image().unwrap().is_none());

        let resp: GeminiResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(resp.into_first_image().unwrap().is_none());
    }

    #[test]
    fn test_block_signals_are_errors() {
        let json = r#"{
            "candidates": [],
            "promptFeedback": {"blockReason": "SAFETY"}
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        let err = resp.into_first_image().unwrap_err();
        assert_eq!(err.to_string(), "content blocked: Prompt blocked: SAFETY");

        let json = r#"{"candidates": [{"finishReason": "IMAGE_SAFETY"}]}"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            resp.into_first_image(),
            Err(UgcError::ContentBlocked(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_returns_decoded_image() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {"parts": [{"inlineData": {"mimeType": "image/jpeg", "data": "aGVsbG8="}}]},
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let food = food();
        let req = GenerationRequest::new("prompt", &food, None);
        let image = provider.generate(&req).await.unwrap().unwrap();

        assert_eq!(image.data, b"hello");
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(
            image.metadata.model.as_deref(),
            Some("gemini-2.5-flash-image")
        );
    }

    #[tokio::test]
    async fn test_generate_without_image_part_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "I cannot draw that"}]}}]
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let food = food();
        let req = GenerationRequest::new("prompt", &food, None);
        assert!(provider.generate(&req).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_generate_maps_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "7")
                    .set_body_string("slow down"),
            )
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let food = food();
        let req = GenerationRequest::new("prompt", &food, None);
        let err = provider.generate(&req).await.unwrap_err();
        assert!(matches!(
            err,
            UgcError::RateLimited { retry_after: Some(d) } if d == Duration::from_secs(7)
        ));
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_unexpected_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let food = food();
        let req = GenerationRequest::new("prompt", &food, None);
        let err = provider.generate(&req).await.unwrap_err();
        assert!(matches!(err, UgcError::UnexpectedResponse(_)));
        assert!(err.to_string().starts_with("unexpected response: malformed Gemini response"));
    }

    #[tokio::test]
    async fn test_generate_maps_auth_and_server_errors() {
        let server = MockServer::start().await;
        let provider = provider_for(&server).await;
        let food = food();
        let req = GenerationRequest::new("prompt", &food, None);

        let auth = Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string(
                r#"{"error":{"message":"API key not valid"}}"#,
            ))
            .mount_as_scoped(&server)
            .await;
        let err = provider.generate(&req).await.unwrap_err();
        assert!(matches!(err, UgcError::Auth(ref m) if m == "API key not valid"));
        drop(auth);

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;
        let err = provider.generate(&req).await.unwrap_err();
        assert_eq!(err.to_string(), "API error: 500 - boom");
    }
}
