//! Upload storage for QuickShare.
//!
//! Every upload is a pair of objects sharing one identifier:
//! - the stored blob, named `{id}{ext}` after the original file's extension
//! - the sidecar, `{id}.json`, holding the [`UploadRecord`]
//!
//! Backends implement [`BlobStore`]. The sidecar is the commit marker: a
//! blob is only reachable once its sidecar exists.

mod local;
mod memory;

pub use local::LocalDiskStore;
pub use memory::MemoryStore;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{QuickShareError, Result};

/// Maximum length of a kept file extension (in characters, without the dot).
pub const MAX_EXTENSION_LENGTH: usize = 16;

/// Extension of the sidecar files.
const SIDECAR_EXTENSION: &str = "json";

/// Opaque identifier naming one upload.
///
/// Always a random UUID in lowercase hyphenated form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(Uuid);

impl FileId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for FileId {
    type Err = QuickShareError;

    /// Parse an identifier. Only the canonical lowercase hyphenated form is
    /// accepted, so a parsed id always maps back to the same file name.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || QuickShareError::Validation(format!("invalid file id: {s:?}"));

        let uuid = Uuid::parse_str(s).map_err(|_| invalid())?;
        let id = Self(uuid);
        if id.to_string() != s {
            return Err(invalid());
        }
        Ok(id)
    }
}

/// Metadata persisted in an upload's sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    /// Upload identifier.
    pub id: FileId,
    /// File name as supplied by the uploader (sanitized).
    pub original_name: String,
    /// When the upload was accepted.
    #[serde(with = "crate::datetime::iso_millis")]
    pub uploaded_at: DateTime<Utc>,
}

impl UploadRecord {
    /// Create a record with a fresh identifier, stamped with the current time.
    ///
    /// The timestamp is truncated to milliseconds, the precision kept in sidecars.
    pub fn new(original_name: impl Into<String>) -> Self {
        Self {
            id: FileId::generate(),
            original_name: original_name.into(),
            uploaded_at: Utc::now().trunc_subsecs(3),
        }
    }

    /// Extension of the original name, if one is kept.
    pub fn extension(&self) -> Option<&str> {
        file_extension(&self.original_name)
    }

    /// Name of the stored blob for this record.
    pub fn stored_name(&self) -> String {
        stored_name(&self.id, &self.original_name)
    }

    /// Name of the sidecar for this record.
    pub fn sidecar_name(&self) -> String {
        sidecar_name(&self.id)
    }
}

/// Extract the extension of a file name, without the dot.
///
/// Returns `None` when the name has no extension or the extension is not
/// 1 to [`MAX_EXTENSION_LENGTH`] ASCII alphanumeric characters.
pub fn file_extension(name: &str) -> Option<&str> {
    let ext = Path::new(name).extension()?.to_str()?;
    let valid = !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LENGTH
        && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then_some(ext)
}

/// Stored blob name: `{id}.{ext}`, or `{id}` when there is no extension.
///
/// A `.json` blob would share the sidecar's name, so it is stored as
/// `{id}.upload.{ext}` instead.
pub fn stored_name(id: &FileId, original_name: &str) -> String {
    match file_extension(original_name) {
        Some(ext) if ext.eq_ignore_ascii_case(SIDECAR_EXTENSION) => format!("{id}.upload.{ext}"),
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    }
}

/// Sidecar name: `{id}.json`.
pub fn sidecar_name(id: &FileId) -> String {
    format!("{id}.{SIDECAR_EXTENSION}")
}

/// Sanitize an uploaded file name.
///
/// Keeps only the last path component (some browsers send full paths),
/// drops control characters and trims surrounding whitespace. Returns
/// `None` when nothing usable is left.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name);
    let cleaned: String = base.chars().filter(|c| !c.is_control()).collect();
    let trimmed = cleaned.trim();

    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Storage backend for uploads.
///
/// Implementations are synchronous; async callers run them on the blocking
/// pool.
pub trait BlobStore: Send + Sync {
    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;

    /// Persist a blob together with its record.
    ///
    /// Either both objects become visible or neither does.
    fn put(&self, record: &UploadRecord, content: &[u8]) -> Result<FileId>;

    /// Read the record for an identifier.
    ///
    /// Returns [`QuickShareError::NotFound`] when the record is missing or
    /// cannot be parsed.
    fn get_meta(&self, id: &FileId) -> Result<UploadRecord>;

    /// Read the blob bytes for an identifier.
    fn get(&self, id: &FileId) -> Result<Vec<u8>>;

    /// Read record and blob together.
    ///
    /// Backends that find the blob through the record override this to
    /// look the record up once.
    fn get_with_meta(&self, id: &FileId) -> Result<(UploadRecord, Vec<u8>)> {
        let record = self.get_meta(id)?;
        let content = self.get(id)?;
        Ok((record, content))
    }
}
