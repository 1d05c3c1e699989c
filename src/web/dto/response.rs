//! Response DTOs for the Web API.

use serde::Serialize;

use crate::datetime::to_rfc3339_millis;
use crate::storage::UploadRecord;

/// Upload response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Share page URL.
    pub url: String,
    /// Upload identifier.
    pub file_id: String,
    /// Original file name.
    pub file_name: String,
}

/// Metadata response, the sidecar contents.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataResponse {
    /// Upload identifier.
    pub id: String,
    /// Original file name.
    pub original_name: String,
    /// Upload time (RFC 3339, milliseconds, UTC).
    pub uploaded_at: String,
}

impl From<UploadRecord> for MetadataResponse {
    fn from(record: UploadRecord) -> Self {
        Self {
            id: record.id.to_string(),
            uploaded_at: to_rfc3339_millis(&record.uploaded_at),
            original_name: record.original_name,
        }
    }
}
