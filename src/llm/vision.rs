//! Request/response types and the provider trait for vision models.
//!
//! A vision request is a single-turn prompt paired with one inline image.
//! Providers translate it into their wire format and return the model's
//! free-text reply.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Mime type declared for every uploaded certificate image.
pub const DEFAULT_IMAGE_MIME_TYPE: &str = "image/png";

/// An image sent inline with the prompt, base64-encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineImage {
    /// Declared mime type of the image.
    pub mime_type: String,
    /// Standard base64 encoding of the image bytes.
    pub data: String,
}

impl InlineImage {
    /// Encode raw image bytes with an explicit mime type.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: STANDARD.encode(bytes),
        }
    }

    /// Encode raw image bytes, declaring them as `image/png`.
    ///
    /// The declared type is fixed regardless of the actual upload format.
    pub fn png(bytes: &[u8]) -> Self {
        Self::from_bytes(DEFAULT_IMAGE_MIME_TYPE, bytes)
    }
}

/// Request for text generation from a vision model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionRequest {
    /// Model identifier; empty means the provider's default.
    pub model: String,
    /// Instruction text.
    pub prompt: String,
    /// Image the prompt refers to.
    pub image: InlineImage,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Maximum number of tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl VisionRequest {
    /// Create a new request with default sampling parameters.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, image: InlineImage) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            image,
            temperature: None,
            max_output_tokens: None,
        }
    }

    /// Set the temperature for this request.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the max output tokens for this request.
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }
}

/// Reply from a vision model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionResponse {
    /// Model that produced the reply.
    pub model: String,
    /// Free-text reply.
    pub text: String,
    /// Reason the generation stopped, when reported.
    pub finish_reason: Option<String>,
    /// Token usage, when reported.
    pub usage: Option<Usage>,
}

/// Token usage statistics for a generation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    /// Number of tokens in the prompt (image included).
    pub prompt_tokens: u32,
    /// Number of tokens generated.
    pub completion_tokens: u32,
    /// Total tokens used.
    pub total_tokens: u32,
}

/// Trait for providers that can answer a prompt about an image.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Generate a reply for the given request.
    async fn generate(&self, request: VisionRequest) -> Result<VisionResponse, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_image_png() {
        let image = InlineImage::png(b"hello");
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "aGVsbG8=");
    }

    #[test]
    fn test_inline_image_explicit_mime() {
        let image = InlineImage::from_bytes("image/jpeg", &[0xff, 0xd8, 0xff]);
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.data, "/9j/");
    }

    #[test]
    fn test_vision_request_builder() {
        let request = VisionRequest::new("gemini-2.5-flash", "describe", InlineImage::png(b""))
            .with_temperature(0.0)
            .with_max_output_tokens(2048);

        assert_eq!(request.model, "gemini-2.5-flash");
        assert_eq!(request.prompt, "describe");
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.max_output_tokens, Some(2048));
    }
}
