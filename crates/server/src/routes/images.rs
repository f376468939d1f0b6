//! Image upload handlers and multipart parsing.

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
};
use bytes::Bytes;
use serde::Serialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::state::AppState;

/// Name of the multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";

/// An uploaded file.
#[derive(Debug)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Response for a temporary upload.
#[derive(Debug, Serialize)]
pub struct TempUploadResponse {
    pub url: String,
}

/// Read the `image` field from a multipart body, skipping any other fields.
///
/// # Errors
///
/// Returns `BadRequest` if the body is malformed or has no `image` field.
pub async fn read_image_field(mut multipart: Multipart) -> Result<ImageUpload> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_owned();
        let bytes = field.bytes().await?;
        return Ok(ImageUpload { file_name, bytes });
    }

    Err(AppError::BadRequest(format!(
        "multipart field '{IMAGE_FIELD}' is required"
    )))
}

/// Upload a preview image that is not attached to a product.
#[instrument(skip(state, multipart))]
pub async fn upload_temp(
    State(state): State<AppState>,
    RequireUser(_user_id): RequireUser,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<TempUploadResponse>> {
    let upload = read_image_field(multipart?).await?;
    let url = state
        .image_service()
        .upload_temporary(&upload.file_name, upload.bytes)
        .await?;
    Ok(Json(TempUploadResponse { url }))
}
