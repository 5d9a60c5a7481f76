// Site store data types

use chrono::{DateTime, Utc};
use hyper::body::Bytes;
use std::path::PathBuf;

/// One file of an upload batch, as received from the client
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Name as sent by the client, unsanitized
    pub original_name: String,
    pub content: Bytes,
    /// Declared content type (informational only, never trusted)
    pub content_type: String,
}

impl UploadFile {
    pub fn new(original_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            original_name: original_name.into(),
            content: content.into(),
            content_type: "application/octet-stream".to_string(),
        }
    }
}

/// A file written by an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub name: String,
    pub size: u64,
    /// Public serving path, e.g. `/sites/demo/index.html`
    pub path: String,
}

/// Confirmation of a successful create-or-update
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    pub subdomain: String,
    pub url: String,
    pub files: Vec<SavedFile>,
}

/// A file currently on disk in a site directory
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub name: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSummary {
    pub name: String,
    pub url: String,
    pub file_count: usize,
    pub files: Vec<String>,
}

/// Outcome of resolving a request path inside a site
#[derive(Debug, Clone)]
pub struct ResolvedFile {
    pub path: PathBuf,
    pub content_type: &'static str,
    /// True when the requested path was missing and `index.html` was used
    pub fallback: bool,
}
