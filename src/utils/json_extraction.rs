//! JSON extraction utilities for parsing vision model responses.
//!
//! Models are asked to reply with bare JSON but regularly wrap it in prose,
//! markdown fences or trailing commentary. This module turns such a reply
//! into a structured value without ever failing: when nothing parses, the
//! caller gets the default value for the requested [`ResponseShape`].
//!
//! # Extraction Strategies
//!
//! The strategies are tried in order:
//! 1. Direct JSON (the trimmed reply parses as-is)
//! 2. Brace block: greedy match from the first `{` to the last `}`
//! 3. Shape default (`{}` or `{"detections": []}`)
//!
//! # Example
//!
//! ```
//! use cert_forge::utils::json_extraction::{normalize_response, ResponseShape};
//!
//! let reply = "Here is my analysis: {\"detections\": []} Let me know!";
//! let normalized = normalize_response(reply, ResponseShape::Detection);
//! assert_eq!(normalized.value, serde_json::json!({"detections": []}));
//! ```

use regex::Regex;
use serde_json::{Map, Value};

/// Key that every detection-shaped result must carry.
pub const DETECTIONS_KEY: &str = "detections";

/// The output contract a normalization call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// Certificate field extraction; defaults to an empty mapping.
    Extraction,
    /// Forgery detection; defaults to `{"detections": []}` and always
    /// carries the `detections` key.
    Detection,
}

impl ResponseShape {
    /// Value returned when no JSON can be recovered from the reply.
    pub fn default_value(self) -> Value {
        match self {
            ResponseShape::Extraction => Value::Object(Map::new()),
            ResponseShape::Detection => {
                let mut map = Map::new();
                map.insert(DETECTIONS_KEY.to_string(), Value::Array(Vec::new()));
                Value::Object(map)
            }
        }
    }

    /// Short name used in log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseShape::Extraction => "extraction",
            ResponseShape::Detection => "detection",
        }
    }
}

/// Which strategy produced a normalized value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// The trimmed reply was valid JSON.
    Direct,
    /// The first-`{`-to-last-`}` substring was valid JSON.
    BraceBlock,
    /// Nothing parsed; the shape default was used.
    Default,
}

/// Result of normalizing a model reply.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedResponse {
    /// The structured value to relay to the caller.
    pub value: Value,
    /// How the value was obtained.
    pub strategy: ExtractionStrategy,
}

impl NormalizedResponse {
    /// Returns true if the reply could not be parsed and the default was used.
    pub fn is_degraded(&self) -> bool {
        self.strategy == ExtractionStrategy::Default
    }

    /// Consumes the response, returning the structured value.
    pub fn into_value(self) -> Value {
        self.value
    }
}

/// Finds the brace-delimited block of a reply.
///
/// The match is greedy and spans newlines: it runs from the first `{` to the
/// last `}` in the content. Replies holding several unrelated objects yield a
/// block that usually fails to parse.
///
/// # Returns
///
/// The matched substring, or None if the content has no `{ ... }` span.
pub fn extract_brace_block(content: &str) -> Option<&str> {
    let re = Regex::new(r"(?s)\{.*\}").ok()?;
    re.find(content).map(|m| m.as_str())
}

/// Parses a reply as JSON using the direct and brace-block strategies.
///
/// # Returns
///
/// The parsed value and the strategy that produced it, or None when neither
/// strategy yields valid JSON.
pub fn parse_json_lenient(content: &str) -> Option<(Value, ExtractionStrategy)> {
    if let Ok(value) = serde_json::from_str::<Value>(content.trim()) {
        return Some((value, ExtractionStrategy::Direct));
    }

    let block = extract_brace_block(content)?;
    serde_json::from_str::<Value>(block)
        .ok()
        .map(|value| (value, ExtractionStrategy::BraceBlock))
}

/// Normalizes a free-text model reply into a structured value.
///
/// Never fails. Parsed content is passed through without validating field
/// types, box coordinates or confidence ranges. For [`ResponseShape::Detection`]
/// the result is always an object whose `detections` entry is a list.
pub fn normalize_response(content: &str, shape: ResponseShape) -> NormalizedResponse {
    let Some((value, strategy)) = parse_json_lenient(content) else {
        return NormalizedResponse {
            value: shape.default_value(),
            strategy: ExtractionStrategy::Default,
        };
    };

    match shape {
        ResponseShape::Extraction => NormalizedResponse { value, strategy },
        ResponseShape::Detection => match ensure_detections_key(value) {
            Some(value) => NormalizedResponse { value, strategy },
            None => NormalizedResponse {
                value: shape.default_value(),
                strategy: ExtractionStrategy::Default,
            },
        },
    }
}

/// Adds an empty `detections` list to an object that lacks one.
///
/// Returns None for non-object values, which cannot carry the key.
fn ensure_detections_key(value: Value) -> Option<Value> {
    let Value::Object(mut map) = value else {
        return None;
    };

    let has_list = map.get(DETECTIONS_KEY).is_some_and(Value::is_array);
    if !has_list {
        map.insert(DETECTIONS_KEY.to_string(), Value::Array(Vec::new()));
    }
    Some(Value::Object(map))
}
