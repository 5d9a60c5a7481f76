// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub sites: SitesConfig,
    pub upload: UploadConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// Listen backlog passed to `listen(2)`
    pub backlog: i32,
}

/// Where site directories live
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub root: String,
}

/// Public addressing of hosted sites
#[derive(Debug, Deserialize, Clone)]
pub struct SitesConfig {
    /// Hosting domain; a site's URL is `https://{subdomain}.{domain}`
    pub domain: String,
}

/// Per-request upload caps
#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    pub max_files: usize,
    pub max_file_size: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json)
    pub access_log_format: String,
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub enable_cors: bool,
    /// Largest accepted request body, checked against `Content-Length` and
    /// enforced while reading uploads
    pub max_body_size: u64,
    /// `max-age` for served site files, 0 disables caching
    pub cache_max_age: u32,
}
