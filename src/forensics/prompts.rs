//! Prompt texts sent to the vision model.
//!
//! Each prompt asks for a bare JSON object matching one response shape. The
//! model does not always comply, which is why replies go through
//! [`crate::utils::json_extraction::normalize_response`].

use crate::utils::json_extraction::ResponseShape;

/// Prompt for certificate field extraction.
///
/// Non-certificates are answered with `{"error": ...}`; missing fields are
/// null.
pub const EXTRACTION_PROMPT: &str = r#"
You are an expert OCR and information extraction system.
First, carefully check whether the given image is an educational marksheet or certificate
(i.e., it should clearly contain information like name, roll number, course, branch, grades,
or other educational details).

If it is NOT an educational certificate/marksheet (for example, a random photo, ID card,
bill, receipt, or unrelated document), return the following JSON exactly:

{
  "error": "Please enter an educational certificate."
}

If it IS an educational certificate/marksheet, extract the following fields:
- Name
- Roll Number
- Course
- Branch
- Year
- CGPA
- SGPA
- Certificate Id
- Institution
- Issue Date

Return the result STRICTLY as a valid JSON object with keys exactly as above.
If a field is missing in the image, set its value to null.
Do not add extra commentary or explanation.
Only return JSON.
"#;

/// Prompt for forgery detection with suspicious-region boxes.
pub const DETECTION_PROMPT: &str = r#"
You are an expert document forensics analyst. Analyze this certificate image for signs of forgery or tampering.

Look for:
- Inconsistent fonts or text alignment
- Suspicious seals or signatures
- Altered dates or numbers
- Mismatched backgrounds or textures
- Signs of digital manipulation

Return a JSON object with a "detections" array. Each detection should have:
- "bbox": [x, y, width, height] - bounding box coordinates (normalized 0-1)
- "class_name": "fake" or "true" - whether this region is suspicious
- "confidence": 0.0 to 1.0 - confidence score

If no suspicious regions found, return empty detections array.
Return ONLY valid JSON, no other text.
"#;

/// Returns the prompt that asks for the given response shape.
pub fn prompt_for(shape: ResponseShape) -> &'static str {
    match shape {
        ResponseShape::Extraction => EXTRACTION_PROMPT,
        ResponseShape::Detection => DETECTION_PROMPT,
    }
}
