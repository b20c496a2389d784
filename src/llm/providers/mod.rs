//! Vision model provider implementations.

pub mod gemini;

pub use gemini::GeminiProvider;

// Re-export the provider trait for convenience
pub use super::vision::VisionProvider;
