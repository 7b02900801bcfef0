//! Anthropic Messages API client for receipt extraction.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use milkslip_core::{AppConfig, AppError, ExtractionFields};

use crate::parse::parse_fields;
use crate::prompt::extraction_prompt;

const API_BASE: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

// Messages API request/response structures
#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<MessageParam>,
}

#[derive(Debug, Serialize)]
struct MessageParam {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Debug, Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    source_type: String,
    media_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlockResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlockResponse {
    Text { text: String },
}

/// Sends a normalized receipt image plus the fixed instruction prompt to a
/// vision-capable model and returns the best-effort structured result.
///
/// Stateless per invocation apart from the shared HTTP connection pool.
#[derive(Debug)]
pub struct VisionExtractor {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl VisionExtractor {
    /// Build an extractor, verifying the credential up front.
    ///
    /// A missing or blank key is a configuration error surfaced here, before
    /// any network call is attempted, never mid-pipeline.
    pub fn new(api_key: &str, model: &str, max_tokens: u32) -> Result<Self, AppError> {
        if api_key.trim().is_empty() {
            return Err(AppError::Configuration(
                "Anthropic API key is required but not provided".to_string(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: API_BASE.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_tokens,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let api_key = config.anthropic_api_key.as_deref().ok_or_else(|| {
            AppError::Configuration("ANTHROPIC_API_KEY is not configured".to_string())
        })?;
        Self::new(api_key, &config.anthropic_model, config.anthropic_max_tokens)
    }

    /// Override the API base URL. Used by tests to point at a local mock.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Run one extraction attempt against the given image bytes.
    ///
    /// Transport and service failures are `ExtractionUnavailable` and may be
    /// retried by re-invoking; a response with no recoverable JSON payload is
    /// `ExtractionMalformed` and needs a fresh attempt.
    pub async fn extract(&self, image: &[u8]) -> Result<ExtractionFields, AppError> {
        use base64::Engine;
        let base64_image = base64::engine::general_purpose::STANDARD.encode(image);
        let media_type = detect_media_type(image);

        let body = MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![MessageParam {
                role: "user".to_string(),
                content: vec![
                    ContentBlock::Image {
                        source: ImageSource {
                            source_type: "base64".to_string(),
                            media_type: media_type.to_string(),
                            data: base64_image,
                        },
                    },
                    ContentBlock::Text {
                        text: extraction_prompt(),
                    },
                ],
            }],
        };

        tracing::debug!(
            image_size = image.len(),
            media_type,
            model = %self.model,
            "Sending receipt image for extraction"
        );

        let response = self
            .http_client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                AppError::ExtractionUnavailable(format!("Vision API request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExtractionUnavailable(format!(
                "Vision API returned {}: {}",
                status, error_text
            )));
        }

        let parsed: MessagesResponse = response.json().await.map_err(|e| {
            AppError::ExtractionUnavailable(format!("Failed to read Vision API response: {}", e))
        })?;

        let text = parsed
            .content
            .into_iter()
            .map(|b| match b {
                ContentBlockResponse::Text { text } => text,
            })
            .next()
            .unwrap_or_default();

        parse_fields(&text)
    }
}

/// Detect media type from image data using magic numbers
fn detect_media_type(data: &[u8]) -> &'static str {
    if data.len() < 4 {
        return "image/jpeg"; // Default
    }

    // JPEG: FF D8 FF
    if data[0] == 0xFF && data[1] == 0xD8 && data[2] == 0xFF {
        return "image/jpeg";
    }

    // PNG: 89 50 4E 47
    if data[0] == 0x89 && data[1] == 0x50 && data[2] == 0x4E && data[3] == 0x47 {
        return "image/png";
    }

    // WebP: RIFF ... WEBP
    if data.len() >= 12
        && data[0] == 0x52
        && data[1] == 0x49
        && data[2] == 0x46
        && data[3] == 0x46
        && data[8] == 0x57
        && data[9] == 0x45
        && data[10] == 0x42
        && data[11] == 0x50
    {
        return "image/webp";
    }

    "image/jpeg" // Default
}
