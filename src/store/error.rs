//! Site store error types

use std::io;
use std::path::PathBuf;

/// Coarse error category, used by the HTTP layer to pick a status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InputValidation,
    TooLarge,
    NotFound,
    Storage,
}

impl ErrorKind {
    pub const fn status_code(self) -> u16 {
        match self {
            Self::InputValidation => 400,
            Self::TooLarge => 413,
            Self::NotFound => 404,
            Self::Storage => 500,
        }
    }
}

/// Errors produced by [`SiteStore`](super::SiteStore) operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Subdomain is required")]
    MissingSubdomain,

    #[error(
        "Invalid subdomain '{0}': use 1-63 letters, digits or hyphens, starting and ending with a letter or digit"
    )]
    InvalidSubdomainFormat(String),

    #[error("No files provided")]
    NoFilesProvided,

    #[error("File type not allowed: {0}")]
    DisallowedFileType(String),

    #[error("An index.html file is required")]
    MissingIndexFile,

    #[error("Exactly one index.html file is allowed, got {0}")]
    DuplicateIndexFile(usize),

    #[error("{0}")]
    OversizeRequest(String),

    #[error("Site not found: {0}")]
    SiteNotFound(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Path is outside the site directory: {0}")]
    PathOutsideSite(String),

    #[error("Storage failure at {}: {source}", path.display())]
    StorageFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingSubdomain
            | Self::InvalidSubdomainFormat(_)
            | Self::NoFilesProvided
            | Self::DisallowedFileType(_)
            | Self::MissingIndexFile
            | Self::DuplicateIndexFile(_) => ErrorKind::InputValidation,
            Self::OversizeRequest(_) => ErrorKind::TooLarge,
            Self::SiteNotFound(_) | Self::FileNotFound(_) | Self::PathOutsideSite(_) => {
                ErrorKind::NotFound
            }
            Self::StorageFailure { .. } => ErrorKind::Storage,
        }
    }

    /// Wrap an I/O error with the path it happened on
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::StorageFailure {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
