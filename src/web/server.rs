//! Web server for QuickShare.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use crate::config::{Config, StorageBackend};
use crate::share::{BaseUrl, ShareService};
use crate::storage::{BlobStore, LocalDiskStore, MemoryStore};
use crate::{QuickShareError, Result};

use super::handlers::AppState;
use super::middleware::RateLimitState;
use super::router::{create_health_router, create_router};

/// Web server for the upload API and pages.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Upload/download operations.
    share: ShareService,
    /// Configured public URL; empty means derive from requests.
    public_url: String,
    /// CORS allowed origins.
    cors_origins: Vec<String>,
    /// Uploads per minute per client IP.
    upload_rate_limit: u32,
    /// Key rate limits on forwarded-for headers.
    trust_proxy: bool,
}

impl WebServer {
    /// Create a new web server with the storage backend named in the config.
    pub fn new(config: &Config) -> Result<Self> {
        let store: Arc<dyn BlobStore> = match config.storage.backend {
            StorageBackend::Local => {
                let store = LocalDiskStore::new(&config.storage.path)?;
                tracing::info!("File storage initialized at: {}", config.storage.path);
                Arc::new(store)
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; uploads are lost on restart");
                Arc::new(MemoryStore::new())
            }
        };

        Self::with_store(config, store)
    }

    /// Create a new web server over an existing store.
    pub fn with_store(config: &Config, store: Arc<dyn BlobStore>) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| QuickShareError::Config(format!("invalid web server address: {e}")))?;

        let share = ShareService::new(store).with_max_upload_size(config.storage.max_upload_bytes());

        Ok(Self {
            addr,
            share,
            public_url: config.server.public_url.clone(),
            cors_origins: config.server.cors_origins.clone(),
            upload_rate_limit: config.server.upload_rate_limit,
            trust_proxy: config.server.trust_proxy,
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn build_router(self, local_addr: SocketAddr) -> Router {
        let base_url = if self.public_url.is_empty() {
            let host = if local_addr.ip().is_unspecified() {
                format!("localhost:{}", local_addr.port())
            } else {
                local_addr.to_string()
            };
            BaseUrl::from_request(&format!("http://{host}"))
        } else {
            BaseUrl::fixed(&self.public_url)
        };

        tracing::info!(
            backend = self.share.backend_name(),
            max_upload_size = self.share.max_upload_size(),
            "Share service ready"
        );

        let app_state = Arc::new(AppState::new(self.share).with_base_url(base_url));

        let rate_limit = Arc::new(
            RateLimitState::new(self.upload_rate_limit).with_trust_proxy(self.trust_proxy),
        );
        rate_limit.clone().start_cleanup_task();

        create_router(app_state, rate_limit, &self.cors_origins)
            .merge(create_health_router())
            .layer(CompressionLayer::new())
    }

    /// Run the web server until Ctrl-C.
    pub async fn run(self) -> std::result::Result<(), std::io::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        let router = self.build_router(local_addr);

        tracing::info!("Web server listening on http://{}", local_addr);

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
    }

    /// Run the server and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::result::Result<SocketAddr, std::io::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        let router = self.build_router(local_addr);

        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
