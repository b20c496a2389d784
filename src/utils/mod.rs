//! Shared utility functions for cert-forge.
//!
//! This module provides common utilities, most notably JSON extraction
//! from free-text model responses.

pub mod json_extraction;

pub use json_extraction::{
    extract_brace_block, normalize_response, parse_json_lenient, ExtractionStrategy,
    NormalizedResponse, ResponseShape, DETECTIONS_KEY,
};
