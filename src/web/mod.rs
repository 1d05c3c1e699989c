//! Web layer for QuickShare.
//!
//! JSON API for uploads and metadata, the upload and share pages, and the
//! public blob path the share page downloads from.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::{create_health_router, create_router};
pub use server::WebServer;
