//! Configuration module for QuickShare.

use serde::Deserialize;
use std::path::Path;

use crate::{QuickShareError, Result};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public base URL used in share links (e.g., "https://share.example.com").
    ///
    /// When empty, the base is derived from the request's Host header.
    #[serde(default)]
    pub public_url: String,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Upload rate limit per client (requests per minute).
    #[serde(default = "default_upload_rate_limit")]
    pub upload_rate_limit: u32,
    /// Take the client IP from `X-Forwarded-For`/`X-Real-IP`.
    ///
    /// Enable only behind a reverse proxy that overwrites these headers.
    #[serde(default)]
    pub trust_proxy: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_upload_rate_limit() -> u32 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: String::new(),
            cors_origins: vec![],
            upload_rate_limit: default_upload_rate_limit(),
            trust_proxy: false,
        }
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Blob and sidecar files in a local directory.
    Local,
    /// In-process map; contents are lost on restart.
    Memory,
}

fn default_backend() -> StorageBackend {
    StorageBackend::Local
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Which backend holds uploads.
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    /// Path to the storage directory (local backend only).
    #[serde(default = "default_storage_path")]
    pub path: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
}

fn default_storage_path() -> String {
    "public/uploads".to_string()
}

fn default_max_upload_size() -> u64 {
    100
}

/// Largest accepted `max_upload_size_mb` (1 TiB).
pub const MAX_UPLOAD_SIZE_MB_LIMIT: u64 = 1024 * 1024;

impl StorageConfig {
    /// Maximum upload size in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_size_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_storage_path(),
            max_upload_size_mb: default_max_upload_size(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/quickshare.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(QuickShareError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration like [`Config::load_with_env`], using defaults
    /// (plus environment overrides) only when the file does not exist.
    ///
    /// Unreadable or invalid files are errors.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        match Self::load_with_env(path.as_ref()) {
            Err(QuickShareError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                eprintln!(
                    "{} not found, using default configuration",
                    path.as_ref().display()
                );
                let mut config = Self::default();
                config.apply_env_overrides();
                Ok(config)
            }
            result => result,
        }
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| QuickShareError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `QUICKSHARE_PUBLIC_URL`: base URL for share links
    /// - `QUICKSHARE_STORAGE_PATH`: storage directory
    /// - `QUICKSHARE_PORT`: listen port
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("QUICKSHARE_PUBLIC_URL") {
            if !url.is_empty() {
                self.server.public_url = url;
            }
        }

        if let Ok(path) = std::env::var("QUICKSHARE_STORAGE_PATH") {
            if !path.is_empty() {
                self.storage.path = path;
            }
        }

        if let Ok(port) = std::env::var("QUICKSHARE_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => eprintln!("Ignoring invalid QUICKSHARE_PORT: {port}"),
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.storage.max_upload_size_mb == 0 {
            return Err(QuickShareError::Config(
                "storage.max_upload_size_mb must be greater than 0".to_string(),
            ));
        }

        if self.storage.max_upload_size_mb > MAX_UPLOAD_SIZE_MB_LIMIT {
            return Err(QuickShareError::Config(format!(
                "storage.max_upload_size_mb must be at most {MAX_UPLOAD_SIZE_MB_LIMIT}"
            )));
        }

        if self.server.upload_rate_limit == 0 {
            return Err(QuickShareError::Config(
                "server.upload_rate_limit must be greater than 0".to_string(),
            ));
        }

        let url = &self.server.public_url;
        if !url.is_empty() && !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(QuickShareError::Config(format!(
                "server.public_url must start with http:// or https:// (got {url})"
            )));
        }

        Ok(())
    }
}
