//! In-memory storage.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::{BlobStore, FileId, UploadRecord};
use crate::{QuickShareError, Result};

/// Upload storage held in process memory.
///
/// Record and blob are inserted under one lock, so a pair is always
/// visible as a whole. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<FileId, (UploadRecord, Vec<u8>)>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored uploads.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store holds no uploads.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlobStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn put(&self, record: &UploadRecord, content: &[u8]) -> Result<FileId> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        if entries.contains_key(&record.id) {
            return Err(QuickShareError::Storage(format!(
                "identifier collision: {}",
                record.id
            )));
        }

        entries.insert(record.id, (record.clone(), content.to_vec()));
        Ok(record.id)
    }

    fn get_meta(&self, id: &FileId) -> Result<UploadRecord> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .map(|(record, _)| record.clone())
            .ok_or_else(|| QuickShareError::NotFound(format!("upload {id}")))
    }

    fn get(&self, id: &FileId) -> Result<Vec<u8>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| QuickShareError::NotFound(format!("upload {id}")))
    }

    fn get_with_meta(&self, id: &FileId) -> Result<(UploadRecord, Vec<u8>)> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| QuickShareError::NotFound(format!("upload {id}")))
    }
}
