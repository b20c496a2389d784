//! Vision model integration for cert-forge.
//!
//! This module defines the provider-neutral request/response types and the
//! [`VisionProvider`] trait, plus the Gemini implementation used in
//! production.
//!
//! ```ignore
//! use cert_forge::llm::{GeminiProvider, InlineImage, VisionProvider, VisionRequest};
//!
//! let provider = GeminiProvider::new(api_key);
//! let request = VisionRequest::new("gemini-2.5-flash", "Describe this image", InlineImage::png(&bytes));
//! let reply = provider.generate(request).await?;
//! println!("{}", reply.text);
//! ```

pub mod providers;
pub mod vision;

pub use providers::GeminiProvider;
pub use vision::{
    InlineImage, Usage, VisionProvider, VisionRequest, VisionResponse, DEFAULT_IMAGE_MIME_TYPE,
};
