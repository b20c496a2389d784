//! Certificate forensics: prompts, result types and the analysis service.
//!
//! Two analyses are offered, both delegated to the vision model:
//!
//! - **Field extraction** reads the certificate's identifying fields
//!   (name, roll number, grades, issuer, ...).
//! - **Forgery detection** returns boxes around regions the model considers
//!   tampered (`fake`) or genuine (`true`), each with a confidence.
//!
//! ```ignore
//! use cert_forge::forensics::ForensicsService;
//! use cert_forge::llm::GeminiProvider;
//! use std::sync::Arc;
//!
//! let service = ForensicsService::new(Arc::new(GeminiProvider::new(api_key)), "gemini-2.5-flash");
//! let verdict = service.detect_forgery(&image_bytes).await?;
//! assert!(verdict.get("detections").is_some());
//! ```

pub mod prompts;
pub mod service;
pub mod types;

pub use prompts::{prompt_for, DETECTION_PROMPT, EXTRACTION_PROMPT};
pub use service::ForensicsService;
pub use types::{
    CertificateFields, Detection, DetectionLabel, DetectionResult, ExtractionResult,
    CERTIFICATE_FIELDS,
};
