//! Metadata handler.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::storage::FileId;
use crate::web::dto::MetadataResponse;
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::QuickShareError;

const METADATA_ERROR: &str = "Failed to fetch file metadata";

/// GET /api/metadata/:file_id - Get the sidecar of an upload.
///
/// A malformed id, a missing sidecar and an unreadable sidecar all answer 404.
pub async fn get_metadata(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> Result<Json<MetadataResponse>, ApiError> {
    let id: FileId = file_id.parse().map_err(|_| {
        tracing::debug!(file_id = %file_id, "Malformed file id");
        ApiError::not_found(METADATA_ERROR)
    })?;

    match state.share.metadata(id).await {
        Ok(record) => Ok(Json(record.into())),
        Err(QuickShareError::NotFound(_)) => Err(ApiError::not_found(METADATA_ERROR)),
        Err(e) => {
            tracing::error!(file_id = %id, error = %e, "Failed to read metadata");
            Err(ApiError::internal(METADATA_ERROR))
        }
    }
}
