//! Router configuration for the web layer.

use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware::{self, Next},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    download_file, file_qr, get_metadata, index_page, serve_upload, share_page, upload_file,
    AppState,
};
use super::middleware::{create_cors_layer, security_headers, upload_rate_limit, RateLimitState};

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the main router: JSON API, pages and stored blobs.
pub fn create_router(
    app_state: Arc<AppState>,
    rate_limit: Arc<RateLimitState>,
    cors_origins: &[String],
) -> Router {
    let body_limit = usize::try_from(app_state.share.max_upload_size())
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    let upload_route = post(upload_file)
        .layer::<_, std::convert::Infallible>(middleware::from_fn(move |req: Request, next: Next| {
            let state = rate_limit.clone();
            upload_rate_limit(state, req, next)
        }))
        .layer(DefaultBodyLimit::max(body_limit));

    let api_routes = Router::new()
        .route("/upload", upload_route)
        .route("/metadata/:file_id", get(get_metadata))
        .route("/files/:file_id/download", get(download_file))
        .route("/files/:file_id/qr", get(file_qr));

    Router::new()
        .route("/", get(index_page))
        .route("/share/:file_id", get(share_page))
        .route("/uploads/:stored_name", get(serve_upload))
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(security_headers)),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
