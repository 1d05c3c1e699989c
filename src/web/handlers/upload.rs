//! Upload handler.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;

use crate::share::share_url;
use crate::storage::sanitize_file_name;
use crate::web::dto::UploadResponse;
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::QuickShareError;

/// Name of the multipart field carrying the file.
const FILE_FIELD: &str = "file";

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!("Upload rejected by body limit: {}", e);
        ApiError::payload_too_large("File too large")
    } else {
        tracing::warn!("Failed to read multipart data: {}", e);
        ApiError::bad_request("Invalid multipart data")
    }
}

/// POST /api/upload - Upload a file.
///
/// Request body: multipart/form-data with a "file" field. Other fields are
/// ignored; the first "file" field carrying a usable file name wins.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut multipart = multipart.map_err(|e| {
        tracing::warn!("Rejected upload request: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })?;

    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        // Browsers send an empty file name when nothing was selected
        let file_name = match field.file_name() {
            Some(name) if sanitize_file_name(name).is_some() => name.to_string(),
            _ => continue,
        };

        let content = field.bytes().await.map_err(multipart_error)?;
        upload = Some((file_name, content.to_vec()));
        break;
    }

    let (file_name, content) = upload.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;

    let record = state
        .share
        .upload(&file_name, content)
        .await
        .map_err(|e| match e {
            QuickShareError::Validation(_) | QuickShareError::TooLarge { .. } => ApiError::from(e),
            e => {
                tracing::error!("Upload error: {}", e);
                ApiError::internal("Upload failed")
            }
        })?;

    let url = share_url(&state.base_url_for(&headers), &record.id);

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            url,
            file_id: record.id.to_string(),
            file_name: record.original_name,
        }),
    ))
}
