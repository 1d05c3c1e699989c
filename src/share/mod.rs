//! File sharing module for QuickShare.
//!
//! This module provides the operations behind the HTTP surface:
//! - Upload with name sanitization and size checks
//! - Metadata lookup and blob download by identifier
//! - Share URL construction and QR rendering

mod qr;
mod service;
mod url;

pub use qr::render_qr_svg;
pub use service::{Download, ShareService};
pub use url::{share_url, BaseUrl};

/// Maximum length for an original filename (in characters).
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Default maximum upload size (100MB).
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 100 * 1024 * 1024;
