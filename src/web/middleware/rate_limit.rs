//! Rate limiting middleware.
//!
//! Uploads are anonymous, so each client IP gets its own quota of
//! uploads per minute.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    num::NonZeroU32,
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use crate::web::error::ApiError;

/// Per-IP rate limiter using Governor.
pub type IpRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// State for rate limiting.
pub struct RateLimitState {
    /// Per-IP rate limiters for the upload endpoint.
    upload_limiters: RwLock<HashMap<String, Arc<IpRateLimiter>>>,
    /// Uploads per minute per IP.
    upload_rate_limit: u32,
    /// Whether forwarded-for headers name the client.
    trust_proxy: bool,
}

impl RateLimitState {
    /// Create a new rate limit state.
    pub fn new(upload_rate_limit: u32) -> Self {
        Self {
            upload_limiters: RwLock::new(HashMap::new()),
            upload_rate_limit,
            trust_proxy: false,
        }
    }

    /// Key clients by `X-Forwarded-For`/`X-Real-IP` instead of the peer
    /// address. Only safe behind a proxy that overwrites those headers.
    pub fn with_trust_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }

    /// Uploads per minute per IP.
    pub fn upload_rate_limit(&self) -> u32 {
        self.upload_rate_limit
    }

    fn get_or_create_limiter(&self, ip: &str) -> Arc<IpRateLimiter> {
        {
            let read_guard = self
                .upload_limiters
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(limiter) = read_guard.get(ip) {
                return limiter.clone();
            }
        }

        let mut write_guard = self
            .upload_limiters
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        // Double-check after acquiring write lock
        if let Some(limiter) = write_guard.get(ip) {
            return limiter.clone();
        }

        let quota =
            Quota::per_minute(NonZeroU32::new(self.upload_rate_limit).unwrap_or(NonZeroU32::MIN));
        let limiter = Arc::new(RateLimiter::direct(quota));
        write_guard.insert(ip.to_string(), limiter.clone());
        limiter
    }

    /// Check if an upload is allowed for the given IP.
    pub fn check_upload(&self, ip: &str) -> bool {
        self.get_or_create_limiter(ip).check().is_ok()
    }

    /// Number of tracked IPs.
    pub fn tracked_ips(&self) -> usize {
        self.upload_limiters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drop limiters that are not in use by a request.
    pub fn cleanup(&self) {
        let mut guard = self
            .upload_limiters
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        guard.retain(|_, v| Arc::strong_count(v) > 1);
    }

    /// Start a background task to periodically clean up old entries.
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(CLEANUP_INTERVAL).await;
                self.cleanup();
            }
        });
    }
}

/// Extract client IP from request.
///
/// Forwarded headers are client-controlled unless a proxy rewrites them,
/// so they are read only when `trust_proxy` is set.
pub fn get_client_ip(req: &Request<Body>, trust_proxy: bool) -> String {
    if trust_proxy {
        if let Some(ip) = forwarded_ip(req) {
            return ip;
        }
    }

    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

fn forwarded_ip(req: &Request<Body>) -> Option<String> {
    // Reverse proxies put the original client first
    let forwarded = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    let real_ip = || {
        req.headers()
            .get("X-Real-IP")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
    };

    forwarded.or_else(real_ip).map(str::to_string)
}

/// Rate limiting middleware for the upload endpoint.
pub async fn upload_rate_limit(
    state: Arc<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = get_client_ip(&req, state.trust_proxy);

    if !state.check_upload(&ip) {
        tracing::warn!(ip = %ip, "Upload rate limit exceeded");
        return ApiError::too_many_requests("Too many uploads. Please try again later.")
            .into_response();
    }

    next.run(req).await
}
