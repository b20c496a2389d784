//! Request handlers.

use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::Json;
use serde_json::Value;
use tracing::info;

use super::error::ApiError;
use super::AppState;

/// Multipart field carrying the uploaded certificate.
pub const UPLOAD_FIELD: &str = "file";

/// Content-type prefix an upload must carry.
const IMAGE_CONTENT_TYPE_PREFIX: &str = "image/";

/// `POST /predict`: forgery detection on an uploaded certificate.
pub async fn predict(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let image = read_image_upload(multipart).await?;
    info!(image_bytes = image.len(), "Received certificate for forgery detection");

    let result = state.service.detect_forgery(&image).await?;
    Ok(Json(result))
}

/// `POST /extract`: field extraction on an uploaded certificate.
pub async fn extract(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let image = read_image_upload(multipart).await?;
    info!(image_bytes = image.len(), "Received certificate for field extraction");

    let result = state.service.extract_fields(&image).await?;
    Ok(Json(result))
}

/// Reads the `file` part of a multipart body, requiring an `image/*` type.
///
/// Other parts are skipped.
async fn read_image_upload(mut multipart: Multipart) -> Result<Bytes, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let is_image = field
            .content_type()
            .is_some_and(|ct| ct.starts_with(IMAGE_CONTENT_TYPE_PREFIX));
        if !is_image {
            return Err(ApiError::NotAnImage);
        }

        return Ok(field.bytes().await?);
    }

    Err(ApiError::MissingFile(UPLOAD_FIELD))
}
