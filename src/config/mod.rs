// Configuration module entry point
// Loads layered configuration and builds the shared application state

mod state;
mod types;

use std::net::SocketAddr;

use crate::store::{SiteStore, UploadLimits};

// Re-export public types
pub use state::AppState;
pub use types::Config;

/// Default config file, looked up without extension
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration with the default config file
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from specified file path (extension optional)
    ///
    /// Precedence, lowest first: defaults, the config file if present,
    /// `SITEHOST_*` environment variables (`__` separates sections), then
    /// `PORT` for the listening port.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("SITEHOST")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.backlog", 1024)?
            .set_default("storage.root", "sites")?
            .set_default("sites.domain", "localhost")?
            .set_default("upload.max_files", 20)?
            .set_default("upload.max_file_size", 10_485_760)? // 10MB
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "sitehost")?
            .set_default("http.enable_cors", false)?
            .set_default("http.max_body_size", 220_200_960)? // 210MB
            .set_default("http.cache_max_age", 3600)?
            .set_override_option("server.port", std::env::var("PORT").ok())?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    pub const fn upload_limits(&self) -> UploadLimits {
        UploadLimits {
            max_files: self.upload.max_files,
            max_file_size: self.upload.max_file_size,
        }
    }

    /// Site store described by this configuration
    pub fn site_store(&self) -> SiteStore {
        SiteStore::new(&self.storage.root, &self.sites.domain).with_limits(self.upload_limits())
    }
}
