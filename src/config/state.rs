// Application state module
// Shared, read-only state handed to every connection

use crate::store::SiteStore;

use super::types::Config;

/// Application state
///
/// Holds no caches: the site store reads the filesystem on every request.
pub struct AppState {
    pub config: Config,
    pub store: SiteStore,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            store: config.site_store(),
            config: config.clone(),
        }
    }
}
