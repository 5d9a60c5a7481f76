//! Subdomain grammar and upload file name rules

use std::path::Path;

use super::error::{Result, StoreError};

/// Maximum subdomain length (one DNS label)
pub const MAX_SUBDOMAIN_LEN: usize = 63;

/// Extensions accepted on upload, compared lowercase
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "html", "css", "js", "txt", "json", "png", "jpg", "jpeg", "gif", "svg", "ico", "webp",
];

pub const INDEX_FILE: &str = "index.html";

/// Check a subdomain against `^[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?$`
pub fn is_valid_subdomain(name: &str) -> bool {
    let bytes = name.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return false;
    };

    bytes.len() <= MAX_SUBDOMAIN_LEN
        && first.is_ascii_alphanumeric()
        && last.is_ascii_alphanumeric()
        && bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-')
}

/// Validate an optional subdomain from a request
pub fn validate_subdomain(name: Option<&str>) -> Result<&str> {
    let name = name
        .filter(|n| !n.is_empty())
        .ok_or(StoreError::MissingSubdomain)?;

    if is_valid_subdomain(name) {
        Ok(name)
    } else {
        Err(StoreError::InvalidSubdomainFormat(name.to_string()))
    }
}

/// Lowercased extension of an uploaded file name, if any
pub fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

pub fn is_allowed_extension(name: &str) -> bool {
    extension_of(name).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

pub fn is_index_name(name: &str) -> bool {
    name.eq_ignore_ascii_case(INDEX_FILE)
}

/// Replace every character outside `[A-Za-z0-9._-]` with `_`
///
/// Path separators never survive, so the result is always a single path
/// component.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
