//! Middleware for the web layer.

pub mod cors;
pub mod rate_limit;
pub mod security;

pub use cors::create_cors_layer;
pub use rate_limit::{upload_rate_limit, RateLimitState};
pub use security::{apply_security_headers, security_headers, BLOB_CSP, PAGE_CSP};
