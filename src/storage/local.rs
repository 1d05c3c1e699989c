//! Local directory storage.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::{sidecar_name, BlobStore, FileId, UploadRecord};
use crate::{QuickShareError, Result};

/// Name of the staging directory inside the storage directory.
const TMP_DIR: &str = ".tmp";

/// Upload storage in a single local directory.
///
/// ```text
/// {base_path}/
/// ├── .tmp/                                        staging for in-flight writes
/// ├── ab12cd34-5678-40ab-8def-123456789012.pdf     blob
/// ├── ab12cd34-5678-40ab-8def-123456789012.json    sidecar
/// └── ...
/// ```
///
/// Both objects are written to `.tmp/` first and renamed into place, blob
/// before sidecar. Readers always start from the sidecar, so a pair is
/// visible only once it is complete.
#[derive(Debug, Clone)]
pub struct LocalDiskStore {
    base_path: PathBuf,
}

impl LocalDiskStore {
    /// Open a store rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(base_path.join(TMP_DIR))?;

        Ok(Self { base_path })
    }

    /// Get the base path of this store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Full path of the blob for a record.
    pub fn blob_path(&self, record: &UploadRecord) -> PathBuf {
        self.base_path.join(record.stored_name())
    }

    /// Full path of the sidecar for an identifier.
    pub fn sidecar_path(&self, id: &FileId) -> PathBuf {
        self.base_path.join(sidecar_name(id))
    }

    /// Write `content` to `dest` through a staging file and an atomic rename.
    fn write_atomic(&self, dest: &Path, content: &[u8]) -> Result<()> {
        let staging = self
            .base_path
            .join(TMP_DIR)
            .join(format!("{}.part", Uuid::new_v4()));

        let result = Self::write_synced(&staging, content).and_then(|()| fs::rename(&staging, dest));
        if let Err(e) = result {
            let _ = fs::remove_file(&staging);
            return Err(e.into());
        }

        Ok(())
    }

    fn write_synced(path: &Path, content: &[u8]) -> io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(content)?;
        file.sync_all()
    }
}

impl LocalDiskStore {
    fn ensure_unused(&self, id: &FileId) -> Result<()> {
        if self.sidecar_path(id).exists() {
            return Err(QuickShareError::Storage(format!(
                "identifier collision: {id}"
            )));
        }
        Ok(())
    }

    /// Move blob then sidecar into place. The sidecar rename is the commit
    /// point; if it fails the blob is removed again.
    fn publish(&self, record: &UploadRecord, content: &[u8]) -> Result<()> {
        let sidecar = serde_json::to_vec_pretty(record)?;
        let blob_path = self.blob_path(record);

        self.write_atomic(&blob_path, content)?;

        if let Err(e) = self.write_atomic(&self.sidecar_path(&record.id), &sidecar) {
            tracing::warn!(file_id = %record.id, error = %e, "Sidecar write failed, removing blob");
            if let Err(rm) = fs::remove_file(&blob_path) {
                tracing::error!(file_id = %record.id, error = %rm, "Failed to remove orphaned blob");
            }
            return Err(e);
        }

        Ok(())
    }

    fn read_blob(&self, record: &UploadRecord) -> Result<Vec<u8>> {
        match fs::read(self.blob_path(record)) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(file_id = %record.id, "Sidecar present but blob missing");
                Err(QuickShareError::NotFound(format!("blob {}", record.id)))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl BlobStore for LocalDiskStore {
    fn backend_name(&self) -> &'static str {
        "local"
    }

    fn put(&self, record: &UploadRecord, content: &[u8]) -> Result<FileId> {
        self.ensure_unused(&record.id)?;
        self.publish(record, content)?;
        Ok(record.id)
    }

    fn get_meta(&self, id: &FileId) -> Result<UploadRecord> {
        let raw = match fs::read(self.sidecar_path(id)) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(QuickShareError::NotFound(format!("upload {id}")));
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<UploadRecord>(&raw) {
            Ok(record) if record.id == *id => Ok(record),
            Ok(record) => {
                tracing::warn!(file_id = %id, recorded_id = %record.id, "Sidecar names a different id");
                Err(QuickShareError::NotFound(format!("upload {id}")))
            }
            Err(e) => {
                tracing::warn!(file_id = %id, error = %e, "Unparsable sidecar");
                Err(QuickShareError::NotFound(format!("upload {id}")))
            }
        }
    }

    fn get(&self, id: &FileId) -> Result<Vec<u8>> {
        let record = self.get_meta(id)?;
        self.read_blob(&record)
    }

    fn get_with_meta(&self, id: &FileId) -> Result<(UploadRecord, Vec<u8>)> {
        let record = self.get_meta(id)?;
        let content = self.read_blob(&record)?;
        Ok((record, content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_store() -> (TempDir, LocalDiskStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalDiskStore::new(temp_dir.path()).unwrap();
        (temp_dir, store)
    }

    /// Names of the entries in the storage directory, staging dir excluded.
    fn stored_entries(store: &LocalDiskStore) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(store.base_path())
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name != TMP_DIR)
            .collect();
        names.sort();
        names
    }

    fn staging_entries(store: &LocalDiskStore) -> usize {
        fs::read_dir(store.base_path().join(TMP_DIR)).unwrap().count()
    }

    #[test]
    fn test_new_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let storage_path = temp_dir.path().join("public").join("uploads");

        assert!(!storage_path.exists());

        let store = LocalDiskStore::new(&storage_path).unwrap();

        assert!(storage_path.is_dir());
        assert!(storage_path.join(TMP_DIR).is_dir());
        assert_eq!(store.base_path(), storage_path);
    }

    #[test]
    fn test_put_writes_blob_and_sidecar() {
        let (_temp_dir, store) = setup_store();
        let record = UploadRecord::new("report.pdf");

        let id = store.put(&record, b"%PDF-1.7").unwrap();

        assert_eq!(id, record.id);
        assert_eq!(
            stored_entries(&store),
            vec![format!("{id}.json"), format!("{id}.pdf")]
        );
        assert_eq!(fs::read(store.blob_path(&record)).unwrap(), b"%PDF-1.7");
        assert_eq!(staging_entries(&store), 0);
    }

    #[test]
    fn test_sidecar_format() {
        let (_temp_dir, store) = setup_store();
        let record = UploadRecord::new("notes.txt");
        store.put(&record, b"hello").unwrap();

        let raw = fs::read_to_string(store.sidecar_path(&record.id)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(value["id"], record.id.to_string());
        assert_eq!(value["originalName"], "notes.txt");
        assert!(value["uploadedAt"].as_str().unwrap().ends_with('Z'));
        // Pretty-printed
        assert!(raw.contains('\n'));
    }

    #[test]
    fn test_get_and_get_meta() {
        let (_temp_dir, store) = setup_store();
        let record = UploadRecord::new("hello.txt");
        store.put(&record, b"Hello, World!").unwrap();

        assert_eq!(store.get_meta(&record.id).unwrap(), record);
        assert_eq!(store.get(&record.id).unwrap(), b"Hello, World!");
    }

    #[test]
    fn test_get_meta_not_found() {
        let (_temp_dir, store) = setup_store();

        let result = store.get_meta(&FileId::generate());

        assert!(matches!(result, Err(QuickShareError::NotFound(_))));
    }

    #[test]
    fn test_get_meta_corrupted_sidecar_is_not_found() {
        let (_temp_dir, store) = setup_store();
        let id = FileId::generate();
        fs::write(store.sidecar_path(&id), b"{ this is not json").unwrap();

        let result = store.get_meta(&id);

        assert!(matches!(result, Err(QuickShareError::NotFound(_))));
    }

    #[test]
    fn test_get_meta_mismatched_id_is_not_found() {
        let (_temp_dir, store) = setup_store();
        let record = UploadRecord::new("a.txt");
        let other = FileId::generate();
        fs::write(
            store.sidecar_path(&other),
            serde_json::to_vec(&record).unwrap(),
        )
        .unwrap();

        assert!(matches!(
            store.get_meta(&other),
            Err(QuickShareError::NotFound(_))
        ));
    }

    #[test]
    fn test_blob_without_sidecar_is_invisible() {
        let (_temp_dir, store) = setup_store();
        let record = UploadRecord::new("orphan.bin");
        fs::write(store.blob_path(&record), b"orphan").unwrap();

        assert!(matches!(
            store.get(&record.id),
            Err(QuickShareError::NotFound(_))
        ));
    }

    #[test]
    fn test_get_missing_blob() {
        let (_temp_dir, store) = setup_store();
        let record = UploadRecord::new("gone.txt");
        store.put(&record, b"data").unwrap();
        fs::remove_file(store.blob_path(&record)).unwrap();

        assert!(matches!(
            store.get(&record.id),
            Err(QuickShareError::NotFound(_))
        ));
    }

    #[test]
    fn test_put_refuses_existing_sidecar() {
        let (_temp_dir, store) = setup_store();
        let record = UploadRecord::new("first.txt");
        store.put(&record, b"first").unwrap();

        let result = store.put(&record, b"second");

        assert!(matches!(result, Err(QuickShareError::Storage(_))));
        assert_eq!(store.get(&record.id).unwrap(), b"first");
    }

    #[test]
    fn test_json_upload_keeps_sidecar() {
        let (_temp_dir, store) = setup_store();
        let record = UploadRecord::new("data.json");
        let content = br#"{"hello":"world"}"#;

        store.put(&record, content).unwrap();

        assert_eq!(store.get_meta(&record.id).unwrap(), record);
        assert_eq!(store.get(&record.id).unwrap(), content);
        assert!(store
            .blob_path(&record)
            .to_string_lossy()
            .ends_with(".upload.json"));
    }

    #[test]
    fn test_no_extension() {
        let (_temp_dir, store) = setup_store();
        let record = UploadRecord::new("Makefile");

        store.put(&record, b"all:").unwrap();

        assert_eq!(
            stored_entries(&store),
            vec![record.id.to_string(), format!("{}.json", record.id)]
        );
    }

    #[test]
    fn test_same_content_two_uploads() {
        let (_temp_dir, store) = setup_store();
        let first = UploadRecord::new("same.txt");
        let second = UploadRecord::new("same.txt");

        store.put(&first, b"identical").unwrap();
        store.put(&second, b"identical").unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(stored_entries(&store).len(), 4);
    }

    #[test]
    fn test_binary_content() {
        let (_temp_dir, store) = setup_store();
        let content: Vec<u8> = (0..=255).collect();
        let record = UploadRecord::new("binary.bin");

        store.put(&record, &content).unwrap();

        assert_eq!(store.get(&record.id).unwrap(), content);
    }

    #[test]
    fn test_large_file() {
        let (_temp_dir, store) = setup_store();
        let content: Vec<u8> = vec![0xAB; 1024 * 1024];
        let record = UploadRecord::new("large.bin");

        store.put(&record, &content).unwrap();

        assert_eq!(fs::metadata(store.blob_path(&record)).unwrap().len(), 1024 * 1024);
        assert_eq!(store.get(&record.id).unwrap(), content);
    }

    #[test]
    fn test_sidecar_failure_removes_blob() {
        let (_temp_dir, store) = setup_store();
        let record = UploadRecord::new("report.pdf");

        store.ensure_unused(&record.id).unwrap();

        // A non-empty directory at the sidecar path makes the final rename fail
        let sidecar_path = store.sidecar_path(&record.id);
        fs::create_dir(&sidecar_path).unwrap();
        fs::write(sidecar_path.join("occupied"), b"x").unwrap();

        let result = store.publish(&record, b"%PDF-1.7");

        assert!(matches!(result, Err(QuickShareError::Io(_))));
        assert!(!store.blob_path(&record).exists());
        assert_eq!(staging_entries(&store), 0);
        assert_eq!(stored_entries(&store), vec![record.sidecar_name()]);
    }

    #[test]
    fn test_get_with_meta() {
        let (_temp_dir, store) = setup_store();
        let record = UploadRecord::new("pair.txt");
        store.put(&record, b"both").unwrap();

        let (meta, content) = store.get_with_meta(&record.id).unwrap();

        assert_eq!(meta, record);
        assert_eq!(content, b"both");
        assert!(matches!(
            store.get_with_meta(&FileId::generate()),
            Err(QuickShareError::NotFound(_))
        ));
    }
}
