//! Error types for cert-forge operations.
//!
//! Defines the error types shared by the library:
//! - Vision model API interactions
//! - Startup configuration
//!
//! HTTP-facing errors live in [`crate::server::error`].

use thiserror::Error;

/// Errors that can occur while talking to the vision model.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse model API response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("Model returned no usable candidate: {reason}")]
    EmptyResponse { reason: String },
}

/// Errors detected while assembling the runtime configuration.
///
/// These are fatal: the process never starts serving when one is returned.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing API key: GEMINI_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("Model name must not be empty")]
    EmptyModel,

    #[error("Invalid API base URL '{0}': must start with http:// or https://")]
    InvalidApiBase(String),

    #[error("Invalid listen address '{0}'")]
    InvalidAddress(String),

    #[error("Upload limit must be at least 1 MiB")]
    InvalidUploadLimit,
}
