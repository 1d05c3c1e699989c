//! Security headers middleware.
//!
//! Two kinds of content leave this server: its own pages and JSON, and
//! bytes uploaded by anonymous users. The pages get a policy that allows
//! their inline scripts; stored blobs carry [`BLOB_CSP`], set by the blob
//! handlers, which keeps uploaded HTML or SVG from running script on this
//! origin.

use axum::{
    body::Body,
    http::{
        header::{self, HeaderName, HeaderValue},
        HeaderMap, Request,
    },
    middleware::Next,
    response::Response,
};

/// Policy for the upload and share pages and the JSON API.
pub const PAGE_CSP: &str = "default-src 'none'; \
    script-src 'self' 'unsafe-inline'; \
    style-src 'self' 'unsafe-inline'; \
    img-src 'self' data: blob:; \
    connect-src 'self'; \
    frame-ancestors 'none'; \
    base-uri 'none'; \
    form-action 'self'";

/// Policy for uploaded bytes: nothing loads, nothing runs.
pub const BLOB_CSP: &str = "default-src 'none'; sandbox";

/// Headers every response carries, replacing whatever a handler set.
const FIXED_HEADERS: [(HeaderName, &str); 4] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "DENY"),
    (header::REFERRER_POLICY, "strict-origin-when-cross-origin"),
    (header::X_XSS_PROTECTION, "0"),
];

/// Add security headers to a response.
///
/// Handlers may choose their own `Content-Security-Policy` and
/// `Cache-Control`; when they don't, responses get [`PAGE_CSP`] and
/// `no-store`.
pub fn apply_security_headers(headers: &mut HeaderMap) {
    for (name, value) in FIXED_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }

    headers
        .entry(header::CONTENT_SECURITY_POLICY)
        .or_insert(HeaderValue::from_static(PAGE_CSP));
    headers
        .entry(header::CACHE_CONTROL)
        .or_insert(HeaderValue::from_static("no-store, max-age=0"));
}

/// Security headers middleware.
pub async fn security_headers(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    apply_security_headers(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::StatusCode, middleware, response::IntoResponse, routing::get, Router,
    };
    use tower::util::ServiceExt;

    async fn page() -> &'static str {
        "OK"
    }

    async fn blob() -> impl IntoResponse {
        (
            [
                (header::CONTENT_SECURITY_POLICY, BLOB_CSP),
                (header::CACHE_CONTROL, "public, max-age=60"),
                (header::X_FRAME_OPTIONS, "SAMEORIGIN"),
            ],
            "<script>alert(1)</script>",
        )
    }

    async fn call(router: Router) -> Response {
        router
            .layer(middleware::from_fn(security_headers))
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_page_defaults() {
        let response = call(Router::new().route("/", get(page))).await;

        assert_eq!(response.status(), StatusCode::OK);

        let headers = response.headers();
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-frame-options"], "DENY");
        assert_eq!(headers["referrer-policy"], "strict-origin-when-cross-origin");
        assert_eq!(headers["x-xss-protection"], "0");
        assert_eq!(headers["content-security-policy"], PAGE_CSP);
        assert_eq!(headers["cache-control"], "no-store, max-age=0");
    }

    #[tokio::test]
    async fn test_handler_policy_kept() {
        let response = call(Router::new().route("/", get(blob))).await;

        let headers = response.headers();
        assert_eq!(headers["content-security-policy"], BLOB_CSP);
        assert_eq!(headers["cache-control"], "public, max-age=60");
        // Fixed headers always win
        assert_eq!(headers["x-frame-options"], "DENY");
    }

    #[test]
    fn test_apply_on_empty_map() {
        let mut headers = HeaderMap::new();
        apply_security_headers(&mut headers);

        assert_eq!(headers.len(), 6);
        assert!(headers["content-security-policy"]
            .to_str()
            .unwrap()
            .contains("frame-ancestors 'none'"));
    }
}
