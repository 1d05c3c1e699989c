//! QuickShare - anonymous instant file sharing
//!
//! Upload a file, get a link and a QR code, hand the link to anyone.
//! No accounts, no expiry.

pub mod config;
pub mod datetime;
pub mod error;
pub mod logging;
pub mod share;
pub mod storage;
pub mod web;

pub use config::{Config, StorageBackend};
pub use error::{QuickShareError, Result};
pub use share::{share_url, BaseUrl, Download, ShareService};
pub use storage::{BlobStore, FileId, LocalDiskStore, MemoryStore, UploadRecord};
pub use web::WebServer;
