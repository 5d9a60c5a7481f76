// API types module
// JSON bodies of the management API

use serde::Serialize;

use crate::store::{SavedFile, SiteSummary, StoredFile, UploadReceipt};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub subdomain: String,
    pub url: String,
    pub files: Vec<UploadedFile>,
}

#[derive(Debug, Serialize)]
pub struct UploadedFile {
    pub name: String,
    pub size: u64,
    pub path: String,
}

impl From<SavedFile> for UploadedFile {
    fn from(file: SavedFile) -> Self {
        Self {
            name: file.name,
            size: file.size,
            path: file.path,
        }
    }
}

impl From<UploadReceipt> for UploadResponse {
    fn from(receipt: UploadReceipt) -> Self {
        Self {
            success: true,
            message: format!("Site '{}' deployed successfully", receipt.subdomain),
            subdomain: receipt.subdomain,
            url: receipt.url,
            files: receipt.files.into_iter().map(UploadedFile::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FilesResponse {
    pub files: Vec<FileInfo>,
}

#[derive(Debug, Serialize)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    /// RFC 3339 timestamp
    pub modified: String,
}

impl From<StoredFile> for FileInfo {
    fn from(file: StoredFile) -> Self {
        Self {
            name: file.name,
            size: file.size,
            modified: file.modified.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SitesResponse {
    pub total: usize,
    pub sites: Vec<SiteInfo>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteInfo {
    pub name: String,
    pub url: String,
    pub file_count: usize,
    pub files: Vec<String>,
}

impl From<SiteSummary> for SiteInfo {
    fn from(site: SiteSummary) -> Self {
        Self {
            name: site.name,
            url: site.url,
            file_count: site.file_count,
            files: site.files,
        }
    }
}
