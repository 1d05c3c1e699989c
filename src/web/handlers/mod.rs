//! API and page handlers.

pub mod file;
pub mod metadata;
pub mod pages;
pub mod upload;

pub use file::*;
pub use metadata::*;
pub use pages::*;
pub use upload::*;

use axum::http::{header, HeaderMap};

use crate::share::{BaseUrl, ShareService};

/// Shared application state.
pub struct AppState {
    /// Upload/download operations.
    pub share: ShareService,
    /// Source of the scheme and host in share links.
    pub base_url: BaseUrl,
}

impl AppState {
    /// Create a new application state deriving share links from the Host header.
    pub fn new(share: ShareService) -> Self {
        Self {
            share,
            base_url: BaseUrl::from_request("http://localhost"),
        }
    }

    /// Set where share link bases come from.
    pub fn with_base_url(mut self, base_url: BaseUrl) -> Self {
        self.base_url = base_url;
        self
    }

    /// Resolve the share link base for a request.
    pub fn base_url_for(&self, headers: &HeaderMap) -> String {
        let host = headers.get(header::HOST).and_then(|v| v.to_str().ok());
        let proto = headers
            .get("X-Forwarded-Proto")
            .and_then(|v| v.to_str().ok());
        self.base_url.resolve(host, proto)
    }
}
