//! Logger module
//!
//! Named log events for the site host, emitted through `tracing`:
//! - Server lifecycle
//! - Access log lines in combined, common or json format
//! - Site lifecycle (deploy, delete)
//! - Errors and warnings

mod format;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};

/// Target used for access log lines, filterable with `RUST_LOG=access=off`
pub const ACCESS_TARGET: &str = "access";

/// Install the global subscriber
///
/// `RUST_LOG` wins over `logging.level` when set. Calling this twice (as
/// tests may) leaves the first subscriber in place.
pub fn init(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    tracing::info!("======================================");
    tracing::info!("Site host started");
    tracing::info!("Listening on: http://{addr}");
    tracing::info!("Store root: {}", config.storage.root);
    tracing::info!("Public domain: {}", config.sites.domain);
    tracing::info!(
        "Upload limits: {} files, {} bytes each",
        config.upload.max_files,
        config.upload.max_file_size
    );
    if let Some(workers) = config.server.workers {
        tracing::info!("Worker threads: {workers}");
    }
    tracing::info!("======================================");
}

pub fn log_server_stop(addr: &SocketAddr) {
    tracing::info!("Server on {addr} stopped accepting connections");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    tracing::debug!("[Connection] Accepted from: {peer_addr}");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    tracing::error!("[ERROR] Failed to serve connection: {err:?}");
}

pub fn log_error(message: &str) {
    tracing::error!("[ERROR] {message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("[WARN] {message}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: ACCESS_TARGET, "{}", entry.format(format));
}

pub fn log_site_deployed(subdomain: &str, file_count: usize) {
    tracing::info!("[Site] Deployed {subdomain} ({file_count} files)");
}

pub fn log_site_deleted(subdomain: &str) {
    tracing::info!("[Site] Deleted {subdomain}");
}

pub fn log_rejected(method: &str, path: &str, status: u16, reason: &str) {
    tracing::warn!("[API] {method} {path} - {status}: {reason}");
}
