//! Typed views of the analysis results.
//!
//! The HTTP layer relays normalized JSON untouched; these types exist so the
//! service and CLI can inspect a result without string-indexing JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Certificate fields requested by the extraction prompt, in prompt order.
pub const CERTIFICATE_FIELDS: [&str; 10] = [
    "Name",
    "Roll Number",
    "Course",
    "Branch",
    "Year",
    "CGPA",
    "SGPA",
    "Certificate Id",
    "Institution",
    "Issue Date",
];

/// Extracted certificate fields. Each value is whatever JSON the model
/// produced (string or number), or None when null/absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertificateFields {
    #[serde(rename = "Name", default)]
    pub name: Option<Value>,
    #[serde(rename = "Roll Number", default)]
    pub roll_number: Option<Value>,
    #[serde(rename = "Course", default)]
    pub course: Option<Value>,
    #[serde(rename = "Branch", default)]
    pub branch: Option<Value>,
    #[serde(rename = "Year", default)]
    pub year: Option<Value>,
    #[serde(rename = "CGPA", default)]
    pub cgpa: Option<Value>,
    #[serde(rename = "SGPA", default)]
    pub sgpa: Option<Value>,
    #[serde(rename = "Certificate Id", default)]
    pub certificate_id: Option<Value>,
    #[serde(rename = "Institution", default)]
    pub institution: Option<Value>,
    #[serde(rename = "Issue Date", default)]
    pub issue_date: Option<Value>,
}

impl CertificateFields {
    fn values(&self) -> [&Option<Value>; 10] {
        [
            &self.name,
            &self.roll_number,
            &self.course,
            &self.branch,
            &self.year,
            &self.cgpa,
            &self.sgpa,
            &self.certificate_id,
            &self.institution,
            &self.issue_date,
        ]
    }

    /// Number of fields the model filled in.
    pub fn present_count(&self) -> usize {
        self.values().iter().filter(|v| v.is_some()).count()
    }

    /// Names of the fields the model left null or omitted.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        CERTIFICATE_FIELDS
            .iter()
            .zip(self.values())
            .filter(|(_, v)| v.is_none())
            .map(|(name, _)| *name)
            .collect()
    }
}

/// Outcome of field extraction: either the field mapping, or the model's
/// refusal when the image is not an educational certificate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtractionResult {
    /// The image was rejected; `error` is a human-readable message.
    Rejected { error: String },
    /// Extracted fields.
    Fields(CertificateFields),
}

impl ExtractionResult {
    /// Reads a normalized extraction value.
    ///
    /// A refusal is an object holding only a string `error`. Returns None for
    /// non-objects and for objects that mix `error` with anything else.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        match object.get("error") {
            Some(Value::String(error)) if object.len() == 1 => Some(ExtractionResult::Rejected {
                error: error.clone(),
            }),
            Some(_) => None,
            None => serde_json::from_value(value.clone())
                .ok()
                .map(ExtractionResult::Fields),
        }
    }
}

/// Region label assigned by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionLabel {
    /// Suspected forgery or tampering.
    Fake,
    /// Region judged genuine.
    True,
}

/// A region of the certificate flagged by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// `[x, y, width, height]`, normalized to the image size.
    pub bbox: [f64; 4],
    pub class_name: DetectionLabel,
    pub confidence: f64,
}

impl Detection {
    /// Returns true if the region is labelled fake.
    pub fn is_suspicious(&self) -> bool {
        self.class_name == DetectionLabel::Fake
    }

    /// Returns true if every box coordinate and the confidence lie in [0, 1].
    ///
    /// Normalization does not enforce this; callers decide what to do with
    /// out-of-range values.
    pub fn is_normalized(&self) -> bool {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        self.bbox.iter().all(|v| in_unit(*v)) && in_unit(self.confidence)
    }
}

/// Forgery detection outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    #[serde(default)]
    pub detections: Vec<Detection>,
}

impl DetectionResult {
    /// Reads a normalized detection value.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }

    /// Regions labelled fake.
    pub fn suspicious(&self) -> impl Iterator<Item = &Detection> {
        self.detections.iter().filter(|d| d.is_suspicious())
    }

    /// Number of regions whose box or confidence falls outside [0, 1].
    pub fn out_of_range(&self) -> usize {
        self.detections.iter().filter(|d| !d.is_normalized()).count()
    }

    /// Highest confidence among regions labelled fake.
    pub fn max_fake_confidence(&self) -> Option<f64> {
        self.suspicious().map(|d| d.confidence).reduce(f64::max)
    }
}
