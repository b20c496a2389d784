//! Certificate analysis service.
//!
//! Sends an image and a fixed prompt to the vision model and normalizes the
//! reply into the requested response shape. Stateless: one service instance
//! is shared by every request.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::LlmError;
use crate::forensics::prompts::prompt_for;
use crate::forensics::types::{DetectionResult, ExtractionResult};
use crate::llm::{InlineImage, VisionProvider, VisionRequest};
use crate::utils::json_extraction::{normalize_response, ResponseShape};

/// Runs certificate analyses against a vision provider.
#[derive(Clone)]
pub struct ForensicsService {
    provider: Arc<dyn VisionProvider>,
    model: String,
}

impl ForensicsService {
    /// Create a service that sends every request to `model`.
    pub fn new(provider: Arc<dyn VisionProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Model identifier used for requests.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Extract certificate fields from an image.
    ///
    /// Returns the field mapping, the model's `{"error": ...}` refusal, or
    /// `{}` when the reply holds no parseable JSON.
    pub async fn extract_fields(&self, image: &[u8]) -> Result<Value, LlmError> {
        self.analyze(image, ResponseShape::Extraction).await
    }

    /// Look for forged or tampered regions in an image.
    ///
    /// The result always carries a `detections` list.
    pub async fn detect_forgery(&self, image: &[u8]) -> Result<Value, LlmError> {
        self.analyze(image, ResponseShape::Detection).await
    }

    /// Run one analysis. Model errors propagate; unparseable replies degrade
    /// to the shape default.
    pub async fn analyze(&self, image: &[u8], shape: ResponseShape) -> Result<Value, LlmError> {
        debug!(
            kind = shape.as_str(),
            image_bytes = image.len(),
            model = %self.model,
            "Requesting certificate analysis"
        );

        let request = VisionRequest::new(&self.model, prompt_for(shape), InlineImage::png(image));
        let response = self.provider.generate(request).await?;

        if let Some(usage) = &response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Model usage"
            );
        }

        let normalized = normalize_response(&response.text, shape);
        if normalized.is_degraded() {
            warn!(
                kind = shape.as_str(),
                reply_chars = response.text.len(),
                "Model reply held no usable JSON, returning default result"
            );
        } else {
            debug!(kind = shape.as_str(), strategy = ?normalized.strategy, "Parsed model reply");
        }

        let value = normalized.into_value();
        log_summary(shape, &value);
        Ok(value)
    }
}

/// Logs what the result says, without altering it.
fn log_summary(shape: ResponseShape, value: &Value) {
    match shape {
        ResponseShape::Detection => match DetectionResult::from_value(value) {
            Ok(result) => {
                info!(
                    regions = result.detections.len(),
                    suspicious = result.suspicious().count(),
                    max_fake_confidence = result.max_fake_confidence().unwrap_or(0.0),
                    "Forgery detection finished"
                );
                let out_of_range = result.out_of_range();
                if out_of_range > 0 {
                    warn!(
                        out_of_range,
                        "Some regions have coordinates or confidence outside [0, 1]"
                    );
                }
            }
            Err(e) => warn!(error = %e, "Detections do not match the expected shape"),
        },
        ResponseShape::Extraction => match ExtractionResult::from_value(value) {
            Some(ExtractionResult::Rejected { error }) => {
                info!(reason = %error, "Model rejected the image as a certificate")
            }
            Some(ExtractionResult::Fields(fields)) => info!(
                present = fields.present_count(),
                missing = ?fields.missing_fields(),
                "Field extraction finished"
            ),
            None => warn!("Extraction result mixes an error with fields or has an unexpected shape"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forensics::prompts::{DETECTION_PROMPT, EXTRACTION_PROMPT};
    use crate::llm::VisionResponse;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Provider that replays a canned reply and records requests.
    struct ScriptedProvider {
        reply: Result<String, u16>,
        seen: Mutex<Vec<VisionRequest>>,
    }

    impl ScriptedProvider {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing(code: u16) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(code),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl VisionProvider for ScriptedProvider {
        async fn generate(&self, request: VisionRequest) -> Result<VisionResponse, LlmError> {
            let model = request.model.clone();
            self.seen.lock().unwrap().push(request);
            match &self.reply {
                Ok(text) => Ok(VisionResponse {
                    model,
                    text: text.clone(),
                    finish_reason: Some("STOP".to_string()),
                    usage: None,
                }),
                Err(code) => Err(LlmError::ApiError {
                    code: *code,
                    message: "upstream failure".to_string(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_detect_forgery_sends_detection_prompt_and_png_image() {
        let provider = ScriptedProvider::replying(r#"{"detections": []}"#);
        let service = ForensicsService::new(provider.clone(), "gemini-2.5-flash");

        let result = service.detect_forgery(b"\x89PNG").await.expect("should succeed");
        assert_eq!(result, json!({"detections": []}));

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "gemini-2.5-flash");
        assert_eq!(seen[0].prompt, DETECTION_PROMPT);
        assert_eq!(seen[0].image.mime_type, "image/png");
        assert_eq!(seen[0].image.data, "iVBORw==");
    }

    #[tokio::test]
    async fn test_detect_forgery_degrades_on_prose() {
        let provider = ScriptedProvider::replying("The certificate looks authentic to me.");
        let service = ForensicsService::new(provider, "m");

        let result = service.detect_forgery(b"img").await.expect("should succeed");
        assert_eq!(result, json!({"detections": []}));
    }

    #[tokio::test]
    async fn test_detect_forgery_passes_regions_through() {
        let reply = r#"Analysis complete.
```json
{"detections": [{"bbox": [0.1, 0.1, 0.2, 0.05], "class_name": "fake", "confidence": 0.9}]}
```"#;
        let provider = ScriptedProvider::replying(reply);
        let service = ForensicsService::new(provider, "m");

        let result = service.detect_forgery(b"img").await.expect("should succeed");
        assert_eq!(result["detections"][0]["class_name"], "fake");
        assert_eq!(result["detections"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_extract_fields_uses_extraction_prompt() {
        let provider = ScriptedProvider::replying(r#"{"Name": "A", "CGPA": null}"#);
        let service = ForensicsService::new(provider.clone(), "m");

        let result = service.extract_fields(b"img").await.expect("should succeed");
        assert_eq!(result, json!({"Name": "A", "CGPA": null}));
        assert_eq!(provider.seen.lock().unwrap()[0].prompt, EXTRACTION_PROMPT);
    }

    #[tokio::test]
    async fn test_extract_fields_relays_mixed_error_unchanged() {
        let provider = ScriptedProvider::replying(r#"{"error": "x", "Name": "A"}"#);
        let service = ForensicsService::new(provider, "m");

        let result = service.extract_fields(b"img").await.expect("should succeed");
        assert_eq!(result, json!({"error": "x", "Name": "A"}));
    }

    #[tokio::test]
    async fn test_detect_forgery_relays_out_of_range_regions() {
        let reply = r#"{"detections": [{"bbox": [0.1, 0.1, 1.5, 0.05], "class_name": "fake", "confidence": 0.9}]}"#;
        let provider = ScriptedProvider::replying(reply);
        let service = ForensicsService::new(provider, "m");

        let result = service.detect_forgery(b"img").await.expect("should succeed");
        assert_eq!(result["detections"][0]["bbox"][2], 1.5);
    }

    #[tokio::test]
    async fn test_extract_fields_degrades_to_empty_map() {
        let provider = ScriptedProvider::replying("Sorry, I cannot read this.");
        let service = ForensicsService::new(provider, "m");

        let result = service.extract_fields(b"img").await.expect("should succeed");
        assert_eq!(result, json!({}));
    }

    #[tokio::test]
    async fn test_model_error_propagates() {
        let provider = ScriptedProvider::failing(503);
        let service = ForensicsService::new(provider, "m");

        let err = service.detect_forgery(b"img").await.unwrap_err();
        assert!(matches!(err, LlmError::ApiError { code: 503, .. }));
    }
}
