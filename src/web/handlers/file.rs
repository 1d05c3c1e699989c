//! Blob download and QR handlers.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::share::{render_qr_svg, share_url, Download};
use crate::storage::FileId;
use crate::web::error::ApiError;
use crate::web::middleware::BLOB_CSP;
use crate::web::handlers::AppState;
use crate::QuickShareError;

/// Blobs never change once stored.
const IMMUTABLE_CACHE: &str = "public, max-age=31536000, immutable";

/// Build a Content-Disposition value that survives hostile file names.
///
/// Control characters (CR/LF header injection), double quotes and
/// backslashes are replaced in the plain `filename` parameter; non-ASCII
/// names additionally get an RFC 5987 `filename*` parameter.
fn content_disposition_header(filename: &str) -> String {
    let needs_escaping = |c: char| c.is_control() || c == '"' || c == '\\';

    if filename.is_ascii() && !filename.chars().any(needs_escaping) {
        return format!("attachment; filename=\"{}\"", filename);
    }

    let fallback: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if needs_escaping(c) || !c.is_ascii() { '_' } else { c })
        .collect();
    let encoded = urlencoding::encode(filename);

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}

fn not_found_or_internal(e: QuickShareError, what: &str) -> ApiError {
    match e {
        QuickShareError::NotFound(_) | QuickShareError::Validation(_) => {
            ApiError::not_found("File not found")
        }
        e => {
            tracing::error!("Failed to load {}: {}", what, e);
            ApiError::internal("Failed to load file")
        }
    }
}

/// Response carrying stored bytes.
///
/// Uploaded content is never rendered on this origin: it is always an
/// attachment and runs under [`BLOB_CSP`].
fn blob_response(download: Download) -> Result<Response<Body>, ApiError> {
    let content_type = mime_guess::from_path(&download.record.original_name)
        .first_or_octet_stream()
        .to_string();
    let disposition = content_disposition_header(&download.record.original_name);

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, download.content.len())
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CONTENT_SECURITY_POLICY, BLOB_CSP)
        .header(header::CACHE_CONTROL, IMMUTABLE_CACHE)
        .body(Body::from(download.content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

/// GET /uploads/:stored_name - Raw bytes of a stored blob.
///
/// The public path the share page downloads from. Only names of stored
/// blobs resolve; sidecars are not served.
pub async fn serve_upload(
    State(state): State<Arc<AppState>>,
    Path(stored_name): Path<String>,
) -> Result<Response<Body>, ApiError> {
    let download = state
        .share
        .download_stored(&stored_name)
        .await
        .map_err(|e| not_found_or_internal(e, "stored file"))?;

    blob_response(download)
}

/// GET /api/files/:file_id/download - Download a file as an attachment.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> Result<Response<Body>, ApiError> {
    let id: FileId = file_id
        .parse()
        .map_err(|_| ApiError::not_found("File not found"))?;

    let download = state
        .share
        .download(id)
        .await
        .map_err(|e| not_found_or_internal(e, "file"))?;

    tracing::info!(file_id = %id, size = download.content.len(), "Serving download");

    blob_response(download)
}

/// GET /api/files/:file_id/qr - SVG QR code of the share link.
pub async fn file_qr(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let id: FileId = file_id
        .parse()
        .map_err(|_| ApiError::not_found("File not found"))?;

    state
        .share
        .metadata(id)
        .await
        .map_err(|e| not_found_or_internal(e, "metadata"))?;

    let url = share_url(&state.base_url_for(&headers), &id);
    let svg = render_qr_svg(&url).map_err(|e| {
        tracing::error!("Failed to render QR code: {}", e);
        ApiError::internal("Failed to render QR code")
    })?;

    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}
