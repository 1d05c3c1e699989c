//! Test helpers for the web API tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::Value;
use tempfile::TempDir;

use quickshare::share::{BaseUrl, ShareService};
use quickshare::storage::{BlobStore, LocalDiskStore, MemoryStore};
use quickshare::web::handlers::AppState;
use quickshare::web::middleware::RateLimitState;
use quickshare::web::router::{create_health_router, create_router};

/// Knobs for a test server.
pub struct TestOptions {
    pub max_upload_size: u64,
    pub upload_rate_limit: u32,
    pub trust_proxy: bool,
    pub base_url: BaseUrl,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            max_upload_size: 10 * 1024 * 1024,
            upload_rate_limit: 1000,
            trust_proxy: false,
            base_url: BaseUrl::from_request("http://localhost:3000"),
        }
    }
}

/// Create a test server over the given store.
pub fn server_with_store(store: Arc<dyn BlobStore>, options: TestOptions) -> TestServer {
    let share = ShareService::new(store).with_max_upload_size(options.max_upload_size);
    let app_state = Arc::new(AppState::new(share).with_base_url(options.base_url));
    let rate_limit = Arc::new(
        RateLimitState::new(options.upload_rate_limit).with_trust_proxy(options.trust_proxy),
    );

    let router = create_router(app_state, rate_limit, &[]).merge(create_health_router());

    TestServer::new(router).expect("Failed to create test server")
}

/// Create a test server backed by memory.
pub fn memory_server() -> (TestServer, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let server = server_with_store(store.clone(), TestOptions::default());
    (server, store)
}

/// Create a test server backed by a temporary directory.
pub fn disk_server() -> (TestServer, TempDir) {
    disk_server_with(TestOptions::default())
}

/// Create a disk-backed test server with custom options.
pub fn disk_server_with(options: TestOptions) -> (TestServer, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = LocalDiskStore::new(temp_dir.path()).expect("Failed to create store");
    let server = server_with_store(Arc::new(store), options);
    (server, temp_dir)
}

/// Multipart form with a single "file" part.
pub fn file_form(file_name: &str, content: &[u8]) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(content.to_vec())
            .file_name(file_name)
            .mime_type("application/octet-stream"),
    )
}

/// Upload a file and return the JSON response; panics unless it was accepted.
pub async fn upload(server: &TestServer, file_name: &str, content: &[u8]) -> Value {
    let response = server
        .post("/api/upload")
        .multipart(file_form(file_name, content))
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()
}

/// File id from an upload response.
pub fn file_id(response: &Value) -> String {
    response["fileId"].as_str().unwrap().to_string()
}

/// Names of the entries in a storage directory, excluding the staging area.
pub fn stored_entries(dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .filter(|n| n != ".tmp")
        .collect();
    names.sort();
    names
}
