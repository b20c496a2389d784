//! Google Gemini provider implementation.
//!
//! Calls the `generateContent` REST endpoint with a single user turn made of
//! a text part and an inline image part.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::llm::{Usage, VisionProvider, VisionRequest, VisionResponse};

/// Default Gemini API endpoint.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model to use if none specified.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Gemini provider for vision requests.
///
/// Requests are sent once: there is no retry and no client-side timeout, so
/// a failing or hanging upstream call surfaces directly to the caller.
pub struct GeminiProvider {
    /// HTTP client for making API requests.
    client: Client,
    /// API key for Gemini authentication.
    api_key: String,
    /// Base URL for the Gemini API.
    base_url: String,
    /// Default model to use when none is specified.
    default_model: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider with the given API key.
    ///
    /// Uses the default model (`gemini-2.5-flash`) and base URL.
    pub fn new(api_key: String) -> Self {
        Self::with_custom_url(api_key, GEMINI_BASE_URL.to_string(), DEFAULT_MODEL.to_string())
    }

    /// Create a new Gemini provider with custom base URL.
    ///
    /// Useful for testing or using Gemini-compatible proxies.
    pub fn with_custom_url(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_model: model,
        }
    }

    /// Get the API key (for debugging, returns masked value).
    pub fn api_key_masked(&self) -> String {
        mask_api_key(&self.api_key)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the default model.
    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Full `generateContent` URL for a model.
    pub fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    /// Execute a single request.
    async fn execute_request(
        &self,
        url: &str,
        model: &str,
        request: &ApiRequest,
    ) -> Result<VisionResponse, LlmError> {
        let http_response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = http_response.status();

        if !status.is_success() {
            let status_code = status.as_u16();
            let error_text = http_response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());

            let message = serde_json::from_str::<ApiErrorResponse>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);

            if status_code == 429 {
                return Err(LlmError::RateLimited(message));
            }
            return Err(LlmError::ApiError {
                code: status_code,
                message,
            });
        }

        let api_response: ApiResponse = http_response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(format!("Failed to parse API response: {}", e)))?;

        convert_response(api_response, model)
    }
}

/// Mask all but the first and last four characters of a key.
pub fn mask_api_key(api_key: &str) -> String {
    let chars: Vec<char> = api_key.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

/// Convert the API envelope into a [`VisionResponse`].
///
/// The reply text is the concatenation of the text parts of the first
/// candidate. A reply without candidates or without text is an error.
fn convert_response(api_response: ApiResponse, model: &str) -> Result<VisionResponse, LlmError> {
    let usage = api_response.usage_metadata.map(|u| Usage {
        prompt_tokens: u.prompt_token_count,
        completion_tokens: u.candidates_token_count,
        total_tokens: u.total_token_count,
    });
    let model = api_response
        .model_version
        .unwrap_or_else(|| model.to_string());

    let Some(candidate) = api_response.candidates.into_iter().next() else {
        let reason = api_response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .map(|r| format!("prompt blocked ({})", r))
            .unwrap_or_else(|| "no candidates returned".to_string());
        return Err(LlmError::EmptyResponse { reason });
    };

    let texts: Vec<String> = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if texts.is_empty() {
        let reason = match candidate.finish_reason.as_deref() {
            Some(finish) => format!("candidate has no text (finish reason {})", finish),
            None => "candidate has no text".to_string(),
        };
        return Err(LlmError::EmptyResponse { reason });
    }

    Ok(VisionResponse {
        model,
        text: texts.concat(),
        finish_reason: candidate.finish_reason,
        usage,
    })
}

#[async_trait]
impl VisionProvider for GeminiProvider {
    async fn generate(&self, request: VisionRequest) -> Result<VisionResponse, LlmError> {
        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model.clone()
        };

        let generation_config = (request.temperature.is_some()
            || request.max_output_tokens.is_some())
        .then(|| ApiGenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_output_tokens,
        });

        let api_request = ApiRequest {
            contents: vec![ApiContentRequest {
                role: "user".to_string(),
                parts: vec![
                    ApiPartRequest::Text {
                        text: request.prompt,
                    },
                    ApiPartRequest::InlineData {
                        inline_data: ApiInlineData {
                            mime_type: request.image.mime_type,
                            data: request.image.data,
                        },
                    },
                ],
            }],
            generation_config,
        };

        tracing::debug!(model = %model, "Sending generateContent request");
        let url = self.endpoint(&model);
        self.execute_request(&url, &model, &api_request).await
    }
}

/// Internal request structure for the Gemini API.
#[derive(Debug, Clone, Serialize)]
struct ApiRequest {
    contents: Vec<ApiContentRequest>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<ApiGenerationConfig>,
}

/// One conversation turn in a request.
#[derive(Debug, Clone, Serialize)]
struct ApiContentRequest {
    role: String,
    parts: Vec<ApiPartRequest>,
}

/// A request part: either text or inline binary data.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum ApiPartRequest {
    Text { text: String },
    InlineData { inline_data: ApiInlineData },
}

/// Inline binary payload.
#[derive(Debug, Clone, Serialize)]
struct ApiInlineData {
    mime_type: String,
    data: String,
}

/// Sampling parameters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

/// Internal response structure from the Gemini API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
    prompt_feedback: Option<ApiPromptFeedback>,
    usage_metadata: Option<ApiUsageMetadata>,
    model_version: Option<String>,
}

/// Internal candidate structure from the API response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCandidate {
    content: Option<ApiContent>,
    finish_reason: Option<String>,
}

/// Internal content structure from the API response.
#[derive(Debug, Deserialize)]
struct ApiContent {
    #[serde(default)]
    parts: Vec<ApiPart>,
}

/// Internal part structure; non-text parts are ignored.
#[derive(Debug, Deserialize)]
struct ApiPart {
    text: Option<String>,
}

/// Prompt feedback, present when the prompt itself was blocked.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPromptFeedback {
    block_reason: Option<String>,
}

/// Internal usage structure from the API response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiUsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

/// Error response from the API.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

/// Error detail from the API.
#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::InlineImage;

    fn parse(body: &str) -> ApiResponse {
        serde_json::from_str(body).expect("fixture should deserialize")
    }

    #[test]
    fn test_gemini_provider_new() {
        let provider = GeminiProvider::new("test-api-key".to_string());

        assert_eq!(provider.base_url(), GEMINI_BASE_URL);
        assert_eq!(provider.default_model(), DEFAULT_MODEL);
        assert_eq!(provider.api_key_masked(), "test...-key");
    }

    #[test]
    fn test_gemini_provider_with_custom_url_trims_slash() {
        let provider = GeminiProvider::with_custom_url(
            "test-key".to_string(),
            "https://proxy.example.com/v1beta/".to_string(),
            "custom-model".to_string(),
        );

        assert_eq!(provider.base_url(), "https://proxy.example.com/v1beta");
        assert_eq!(
            provider.endpoint("custom-model"),
            "https://proxy.example.com/v1beta/models/custom-model:generateContent"
        );
    }

    #[test]
    fn test_api_key_masked_short() {
        assert_eq!(mask_api_key("abc"), "***");
    }

    #[test]
    fn test_api_key_masked_normal() {
        assert_eq!(mask_api_key("AIzaSyD1234567890abcd"), "AIza...abcd");
    }

    #[test]
    fn test_api_request_serialization() {
        let image = InlineImage::png(b"img");
        let request = ApiRequest {
            contents: vec![ApiContentRequest {
                role: "user".to_string(),
                parts: vec![
                    ApiPartRequest::Text {
                        text: "Analyze".to_string(),
                    },
                    ApiPartRequest::InlineData {
                        inline_data: ApiInlineData {
                            mime_type: image.mime_type,
                            data: image.data,
                        },
                    },
                ],
            }],
            generation_config: None,
        };

        let json = serde_json::to_value(&request).expect("serialization should succeed");
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Analyze");
        assert_eq!(
            json["contents"][0]["parts"][1]["inline_data"]["mime_type"],
            "image/png"
        );
        assert_eq!(json["contents"][0]["parts"][1]["inline_data"]["data"], "aW1n");
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn test_generation_config_serialization() {
        let config = ApiGenerationConfig {
            temperature: Some(0.2),
            max_output_tokens: None,
        };
        let json = serde_json::to_string(&config).expect("serialization should succeed");
        assert_eq!(json, r#"{"temperature":0.2}"#);
    }

    #[test]
    fn test_convert_response_concatenates_parts() {
        let body = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "{\"detections\":"}, {"text": " []}"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 1290, "candidatesTokenCount": 12, "totalTokenCount": 1302},
            "modelVersion": "gemini-2.5-flash"
        }"#;

        let response = convert_response(parse(body), "fallback").expect("should convert");
        assert_eq!(response.text, "{\"detections\": []}");
        assert_eq!(response.model, "gemini-2.5-flash");
        assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
        assert_eq!(
            response.usage,
            Some(Usage {
                prompt_tokens: 1290,
                completion_tokens: 12,
                total_tokens: 1302,
            })
        );
    }

    #[test]
    fn test_convert_response_uses_requested_model_when_unreported() {
        let body = r#"{"candidates": [{"content": {"parts": [{"text": "ok"}]}}]}"#;
        let response = convert_response(parse(body), "gemini-test").expect("should convert");
        assert_eq!(response.model, "gemini-test");
        assert!(response.usage.is_none());
    }

    #[test]
    fn test_convert_response_blocked_prompt() {
        let body = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let err = convert_response(parse(body), "m").unwrap_err();
        match err {
            LlmError::EmptyResponse { reason } => assert!(reason.contains("SAFETY")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_convert_response_candidate_without_text() {
        let body = r#"{"candidates": [{"finishReason": "MAX_TOKENS"}]}"#;
        let err = convert_response(parse(body), "m").unwrap_err();
        match err {
            LlmError::EmptyResponse { reason } => assert!(reason.contains("MAX_TOKENS")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_response_parsing() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}}"#;
        let parsed: ApiErrorResponse = serde_json::from_str(body).expect("should parse");
        assert_eq!(parsed.error.message, "API key not valid.");
    }

    #[tokio::test]
    async fn test_generate_connection_error() {
        let provider = GeminiProvider::with_custom_url(
            "test-key".to_string(),
            "http://localhost:65535".to_string(),
            "test-model".to_string(),
        );

        let request = VisionRequest::new("", "test", InlineImage::png(b"x"));
        let result = provider.generate(request).await;

        assert!(matches!(result, Err(LlmError::RequestFailed(_))));
    }
}
