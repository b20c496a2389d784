//! cert-forge: certificate forgery analysis backed by a vision model.
//!
//! The library accepts certificate images, asks a generative vision model
//! (Google Gemini) to extract fields or flag tampered regions, and turns the
//! model's free-text reply into well-formed JSON.

pub mod cli;
pub mod config;
pub mod error;
pub mod forensics;
pub mod llm;
pub mod server;
pub mod utils;

// Re-export commonly used error types
pub use error::{ConfigError, LlmError};
