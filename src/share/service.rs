//! Share service for QuickShare.

use std::sync::Arc;

use crate::storage::{sanitize_file_name, BlobStore, FileId, UploadRecord};
use crate::{QuickShareError, Result};

use super::{DEFAULT_MAX_UPLOAD_SIZE, MAX_FILENAME_LENGTH};

/// Result of a download.
#[derive(Debug)]
pub struct Download {
    /// Upload record.
    pub record: UploadRecord,
    /// Blob content.
    pub content: Vec<u8>,
}

/// Upload, metadata and download operations over a [`BlobStore`].
///
/// Store calls are blocking and run on tokio's blocking pool.
#[derive(Clone)]
pub struct ShareService {
    store: Arc<dyn BlobStore>,
    max_upload_size: u64,
}

impl ShareService {
    /// Create a new ShareService.
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self {
            store,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }

    /// Set the maximum upload size in bytes.
    pub fn with_max_upload_size(mut self, max_bytes: u64) -> Self {
        self.max_upload_size = max_bytes;
        self
    }

    /// Maximum upload size in bytes.
    pub fn max_upload_size(&self) -> u64 {
        self.max_upload_size
    }

    /// Name of the underlying storage backend.
    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// Store an uploaded file.
    ///
    /// # Validation
    /// - File name: must be non-empty after sanitizing, max 255 characters
    /// - File size: max configured size
    ///
    /// # Returns
    /// The record written to the sidecar.
    pub async fn upload(&self, file_name: &str, content: Vec<u8>) -> Result<UploadRecord> {
        let original_name = sanitize_file_name(file_name)
            .ok_or_else(|| QuickShareError::Validation("file name is empty".to_string()))?;

        if original_name.chars().count() > MAX_FILENAME_LENGTH {
            return Err(QuickShareError::Validation(format!(
                "file name must be at most {MAX_FILENAME_LENGTH} characters"
            )));
        }

        if content.len() as u64 > self.max_upload_size {
            return Err(QuickShareError::TooLarge {
                max_bytes: self.max_upload_size,
            });
        }

        let record = UploadRecord::new(original_name);
        let size = content.len();

        let store = Arc::clone(&self.store);
        let stored = record.clone();
        run_blocking(move || store.put(&stored, &content)).await?;

        tracing::info!(
            file_id = %record.id,
            size,
            backend = self.store.backend_name(),
            "Stored upload"
        );

        Ok(record)
    }

    /// Look up the record for an identifier.
    pub async fn metadata(&self, id: FileId) -> Result<UploadRecord> {
        let store = Arc::clone(&self.store);
        run_blocking(move || store.get_meta(&id)).await
    }

    /// Load the record and blob for an identifier.
    pub async fn download(&self, id: FileId) -> Result<Download> {
        let store = Arc::clone(&self.store);
        let (record, content) = run_blocking(move || store.get_with_meta(&id)).await?;
        Ok(Download { record, content })
    }

    /// Load a blob by its stored name (`{id}{ext}`).
    ///
    /// The name must match the stored name recorded for the identifier;
    /// anything else, sidecar names included, is reported as not found.
    pub async fn download_stored(&self, stored_name: &str) -> Result<Download> {
        let not_found = || QuickShareError::NotFound(format!("stored file {stored_name}"));

        let stem = stored_name.split('.').next().unwrap_or(stored_name);
        let id: FileId = stem.parse().map_err(|_| not_found())?;

        let download = self.download(id).await?;
        if download.record.stored_name() != stored_name {
            return Err(not_found());
        }

        Ok(download)
    }
}

/// Run a blocking store call on the blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| QuickShareError::Storage(format!("storage task failed: {e}")))?
}
