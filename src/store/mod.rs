//! Site store
//!
//! Owns the on-disk tree of hosted sites: one directory per subdomain under a
//! single store root, with a flat set of files inside. The filesystem is the
//! only source of truth and is re-read on every call.

mod error;
pub mod naming;
mod types;

use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use hyper::body::Bytes;
use tokio::fs;

use crate::http::mime;

pub use error::{ErrorKind, Result, StoreError};
pub use naming::INDEX_FILE;
pub use types::{ResolvedFile, SavedFile, SiteSummary, StoredFile, UploadFile, UploadReceipt};

/// Per-request upload caps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_files: usize,
    pub max_file_size: u64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_files: 20,
            max_file_size: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SiteStore {
    root: PathBuf,
    domain: String,
    limits: UploadLimits,
}

impl SiteStore {
    /// Create a store rooted at `root`, deriving public URLs from `domain`
    ///
    /// The root directory is created lazily by the first upload.
    pub fn new(root: impl Into<PathBuf>, domain: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            domain: domain.into(),
            limits: UploadLimits::default(),
        }
    }

    #[must_use]
    pub const fn with_limits(mut self, limits: UploadLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub const fn limits(&self) -> UploadLimits {
        self.limits
    }

    pub fn site_url(&self, subdomain: &str) -> String {
        format!("https://{subdomain}.{}", self.domain)
    }

    /// Create a site or merge files into an existing one
    ///
    /// The whole batch is validated before anything touches the disk, so a
    /// rejected upload leaves no trace. Files already in the site under other
    /// names are kept.
    pub async fn create_or_update(
        &self,
        subdomain: Option<&str>,
        files: Vec<UploadFile>,
    ) -> Result<UploadReceipt> {
        let subdomain = naming::validate_subdomain(subdomain)?;
        self.validate_batch(&files)?;

        let dir = self.root.join(subdomain);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::storage(&dir, e))?;

        let mut saved = Vec::with_capacity(files.len());
        for file in files {
            let name = if naming::is_index_name(&file.original_name) {
                INDEX_FILE.to_string()
            } else {
                naming::sanitize_file_name(&file.original_name)
            };
            write_file(&dir, &name, file.content.clone()).await?;
            tracing::debug!(
                "Stored {subdomain}/{name} ({} bytes, declared {})",
                file.content.len(),
                file.content_type
            );
            saved.push(SavedFile {
                path: format!("/sites/{subdomain}/{name}"),
                size: file.content.len() as u64,
                name,
            });
        }

        Ok(UploadReceipt {
            subdomain: subdomain.to_string(),
            url: self.site_url(subdomain),
            files: saved,
        })
    }

    /// Files currently stored for a site, sorted by name
    pub async fn list_files(&self, subdomain: &str) -> Result<Vec<StoredFile>> {
        let dir = self.existing_site_dir(subdomain).await?;
        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|e| StoreError::storage(&dir, e))?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::storage(&dir, e))?
        {
            let path = entry.path();
            let meta = entry
                .metadata()
                .await
                .map_err(|e| StoreError::storage(&path, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !meta.is_file() || is_partial_name(&name) {
                continue;
            }
            let modified = meta.modified().map_err(|e| StoreError::storage(&path, e))?;
            files.push(StoredFile {
                name,
                size: meta.len(),
                modified: DateTime::<Utc>::from(modified),
            });
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    /// Recursively remove a site and everything in it
    pub async fn delete_site(&self, subdomain: &str) -> Result<()> {
        let dir = self.existing_site_dir(subdomain).await?;
        fs::remove_dir_all(&dir)
            .await
            .map_err(|e| StoreError::storage(&dir, e))
    }

    /// Summaries of every site directory, sorted by name
    pub async fn list_sites(&self) -> Result<Vec<SiteSummary>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::storage(&self.root, e)),
        };

        let mut sites = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::storage(&self.root, e))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| StoreError::storage(&path, e))?;
            if !file_type.is_dir() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            let files = file_names(&path).await?;
            sites.push(SiteSummary {
                url: self.site_url(&name),
                file_count: files.len(),
                files,
                name,
            });
        }

        sites.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(sites)
    }

    /// Map a request path inside a site to the file that should be sent
    ///
    /// `""` and `"/"` mean `index.html`. A missing file falls back to the
    /// site's `index.html` so client-side routes work. Paths that would leave
    /// the site directory are refused without touching the disk.
    pub async fn resolve(&self, subdomain: &str, request_path: &str) -> Result<ResolvedFile> {
        let dir = self.existing_site_dir(subdomain).await?;

        let relative = request_path.trim_start_matches('/');
        let relative = if relative.is_empty() {
            INDEX_FILE
        } else {
            relative
        };

        let contained = Path::new(relative)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !contained {
            return Err(StoreError::PathOutsideSite(request_path.to_string()));
        }

        let candidate = dir.join(relative);
        let in_progress = candidate
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_partial_name);
        if !in_progress && is_file(&candidate).await {
            return Ok(ResolvedFile {
                content_type: content_type_for(&candidate),
                path: candidate,
                fallback: false,
            });
        }

        let index = dir.join(INDEX_FILE);
        if is_file(&index).await {
            return Ok(ResolvedFile {
                content_type: content_type_for(&index),
                path: index,
                fallback: true,
            });
        }

        Err(StoreError::FileNotFound(request_path.to_string()))
    }

    fn validate_batch(&self, files: &[UploadFile]) -> Result<()> {
        if files.is_empty() {
            return Err(StoreError::NoFilesProvided);
        }
        if files.len() > self.limits.max_files {
            return Err(StoreError::OversizeRequest(format!(
                "Too many files: {} (max {})",
                files.len(),
                self.limits.max_files
            )));
        }
        if let Some(big) = files
            .iter()
            .find(|f| f.content.len() as u64 > self.limits.max_file_size)
        {
            return Err(StoreError::OversizeRequest(format!(
                "File too large: {} (max {} bytes)",
                big.original_name, self.limits.max_file_size
            )));
        }
        if let Some(bad) = files
            .iter()
            .find(|f| !naming::is_allowed_extension(&f.original_name))
        {
            return Err(StoreError::DisallowedFileType(bad.original_name.clone()));
        }

        match files
            .iter()
            .filter(|f| naming::is_index_name(&f.original_name))
            .count()
        {
            0 => Err(StoreError::MissingIndexFile),
            1 => Ok(()),
            n => Err(StoreError::DuplicateIndexFile(n)),
        }
    }

    /// Directory of an existing site
    ///
    /// Names outside the subdomain grammar can never have been created, so
    /// they are reported as missing without building a path from them.
    async fn existing_site_dir(&self, subdomain: &str) -> Result<PathBuf> {
        if !naming::is_valid_subdomain(subdomain) {
            return Err(StoreError::SiteNotFound(subdomain.to_string()));
        }
        let dir = self.root.join(subdomain);
        match fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => Ok(dir),
            Ok(_) => Err(StoreError::SiteNotFound(subdomain.to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::SiteNotFound(subdomain.to_string()))
            }
            Err(e) => Err(StoreError::storage(&dir, e)),
        }
    }
}

/// Prefix and suffix of in-flight upload files inside a site directory
///
/// `partial` is not an allowed extension, so no stored file can match.
const PARTIAL_PREFIX: &str = ".upload-";
const PARTIAL_SUFFIX: &str = ".partial";

fn is_partial_name(name: &str) -> bool {
    name.starts_with(PARTIAL_PREFIX) && name.ends_with(PARTIAL_SUFFIX)
}

/// Write through a uniquely named temporary sibling and rename, so readers
/// never see a half-written file and concurrent writers of one name do not
/// share a temp file
async fn write_file(dir: &Path, name: &str, content: Bytes) -> Result<()> {
    let target = dir.join(name);
    let dir = dir.to_path_buf();
    let dest = target.clone();

    match tokio::task::spawn_blocking(move || persist_file(&dir, &dest, &content)).await {
        Ok(result) => result,
        Err(e) => Err(StoreError::storage(target, io::Error::other(e))),
    }
}

fn persist_file(dir: &Path, target: &Path, content: &[u8]) -> Result<()> {
    let mut partial = tempfile::Builder::new()
        .prefix(PARTIAL_PREFIX)
        .suffix(PARTIAL_SUFFIX)
        .tempfile_in(dir)
        .map_err(|e| StoreError::storage(dir, e))?;
    partial
        .write_all(content)
        .map_err(|e| StoreError::storage(partial.path(), e))?;
    // A failed persist drops the temp file, which removes it
    partial
        .persist(target)
        .map_err(|e| StoreError::storage(target, e.error))?;
    Ok(())
}

async fn file_names(dir: &Path) -> Result<Vec<String>> {
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| StoreError::storage(dir, e))?;

    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StoreError::storage(dir, e))?
    {
        let is_file = entry.file_type().await.is_ok_and(|t| t.is_file());
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_file && !is_partial_name(&name) {
            names.push(name);
        }
    }
    Ok(names)
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_file())
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    mime::get_content_type(ext.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(tmp: &TempDir) -> SiteStore {
        SiteStore::new(tmp.path().join("sites"), "example.test")
    }

    fn site_files() -> Vec<UploadFile> {
        vec![
            UploadFile::new("index.html", "<h1>hello</h1>"),
            UploadFile::new("style.css", "body{}"),
        ]
    }

    async fn sorted_names(store: &SiteStore, subdomain: &str) -> Vec<String> {
        let mut names: Vec<String> = store
            .list_files(subdomain)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_upload_then_list_contains_index() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        let receipt = store
            .create_or_update(Some("demo-1"), site_files())
            .await
            .unwrap();
        assert_eq!(receipt.subdomain, "demo-1");
        assert_eq!(receipt.url, "https://demo-1.example.test");
        assert_eq!(receipt.files.len(), 2);
        assert_eq!(receipt.files[0].path, "/sites/demo-1/index.html");
        assert_eq!(receipt.files[1].size, 6);

        assert_eq!(
            sorted_names(&store, "demo-1").await,
            vec!["index.html", "style.css"]
        );
    }

    #[tokio::test]
    async fn test_missing_index_persists_nothing() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        let err = store
            .create_or_update(Some("demo"), vec![UploadFile::new("app.js", "1")])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingIndexFile));
        assert!(!store.root().join("demo").exists());
    }

    #[tokio::test]
    async fn test_duplicate_index_rejected() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        let err = store
            .create_or_update(
                Some("demo"),
                vec![
                    UploadFile::new("index.html", "a"),
                    UploadFile::new("INDEX.html", "b"),
                ],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateIndexFile(2)));
    }

    #[tokio::test]
    async fn test_disallowed_type_creates_no_site() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        let mut files = site_files();
        files.push(UploadFile::new("setup.exe", "MZ"));
        let err = store
            .create_or_update(Some("demo"), files)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DisallowedFileType(ref n) if n == "setup.exe"));
        assert_eq!(err.kind(), ErrorKind::InputValidation);
        assert!(!store.root().join("demo").exists());
    }

    #[tokio::test]
    async fn test_validation_order() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        let err = store.create_or_update(None, Vec::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingSubdomain));

        let err = store
            .create_or_update(Some("-bad"), Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidSubdomainFormat(_)));

        let err = store
            .create_or_update(Some("good"), Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NoFilesProvided));

        // Extension is checked before the index requirement
        let err = store
            .create_or_update(Some("good"), vec![UploadFile::new("x.exe", "")])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DisallowedFileType(_)));
    }

    #[tokio::test]
    async fn test_upload_limits() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp).with_limits(UploadLimits {
            max_files: 2,
            max_file_size: 4,
        });

        let mut files = site_files();
        files.push(UploadFile::new("a.txt", "a"));
        let err = store
            .create_or_update(Some("demo"), files)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::OversizeRequest(_)));
        assert_eq!(err.kind().status_code(), 413);

        let err = store
            .create_or_update(Some("demo"), vec![UploadFile::new("index.html", "12345")])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::OversizeRequest(_)));
        assert!(!store.root().join("demo").exists());
    }

    #[tokio::test]
    async fn test_traversal_name_stays_inside_site() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        let receipt = store
            .create_or_update(
                Some("demo"),
                vec![
                    UploadFile::new("index.html", "home"),
                    UploadFile::new("../../etc/passwd.html", "nope"),
                ],
            )
            .await
            .unwrap();
        assert_eq!(receipt.files[1].name, ".._.._etc_passwd.html");
        assert!(store.root().join("demo/.._.._etc_passwd.html").is_file());
        assert!(!tmp.path().join("etc").exists());
    }

    #[tokio::test]
    async fn test_index_stored_with_exact_name() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        store
            .create_or_update(Some("demo"), vec![UploadFile::new("Index.HTML", "x")])
            .await
            .unwrap();
        assert_eq!(sorted_names(&store, "demo").await, vec!["index.html"]);
    }

    #[tokio::test]
    async fn test_reupload_merges_and_overwrites() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        store
            .create_or_update(Some("demo"), site_files())
            .await
            .unwrap();
        store
            .create_or_update(
                Some("demo"),
                vec![
                    UploadFile::new("index.html", "v2"),
                    UploadFile::new("app.js", "js"),
                ],
            )
            .await
            .unwrap();

        assert_eq!(
            sorted_names(&store, "demo").await,
            vec!["app.js", "index.html", "style.css"]
        );
        let index = std::fs::read_to_string(store.root().join("demo/index.html")).unwrap();
        assert_eq!(index, "v2");
    }

    #[tokio::test]
    async fn test_list_files_metadata() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        store
            .create_or_update(Some("demo"), site_files())
            .await
            .unwrap();

        let files = store.list_files("demo").await.unwrap();
        let index = files.iter().find(|f| f.name == "index.html").unwrap();
        assert_eq!(index.size, 14);
        assert!(index.modified <= Utc::now());
    }

    #[tokio::test]
    async fn test_list_files_unknown_site() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        assert!(matches!(
            store.list_files("ghost").await,
            Err(StoreError::SiteNotFound(_))
        ));
        assert!(matches!(
            store.list_files("..").await,
            Err(StoreError::SiteNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_then_list_fails() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        store
            .create_or_update(Some("demo"), site_files())
            .await
            .unwrap();

        store.delete_site("demo").await.unwrap();
        assert!(matches!(
            store.list_files("demo").await,
            Err(StoreError::SiteNotFound(_))
        ));
        assert!(matches!(
            store.delete_site("demo").await,
            Err(StoreError::SiteNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_sites_empty_store() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        assert!(store.list_sites().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_sites_summaries() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        store
            .create_or_update(Some("beta"), site_files())
            .await
            .unwrap();
        store
            .create_or_update(Some("alpha"), vec![UploadFile::new("index.html", "a")])
            .await
            .unwrap();
        std::fs::write(store.root().join("stray.txt"), "ignored").unwrap();

        let sites = store.list_sites().await.unwrap();
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].name, "alpha");
        assert_eq!(sites[0].url, "https://alpha.example.test");
        assert_eq!(sites[0].files, vec!["index.html"]);
        assert_eq!(sites[1].name, "beta");
        assert_eq!(sites[1].file_count, 2);
    }

    #[tokio::test]
    async fn test_resolve_root_and_fallback() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        store
            .create_or_update(Some("demo"), site_files())
            .await
            .unwrap();

        let root = store.resolve("demo", "/").await.unwrap();
        assert!(root.path.ends_with("demo/index.html"));
        assert_eq!(root.content_type, "text/html; charset=utf-8");
        assert!(!root.fallback);

        let empty = store.resolve("demo", "").await.unwrap();
        assert!(empty.path.ends_with("demo/index.html"));

        let missing = store.resolve("demo", "/nonexistent").await.unwrap();
        assert!(missing.path.ends_with("demo/index.html"));
        assert!(missing.fallback);

        let css = store.resolve("demo", "/style.css").await.unwrap();
        assert!(css.path.ends_with("demo/style.css"));
        assert_eq!(css.content_type, "text/css; charset=utf-8");
    }

    #[tokio::test]
    async fn test_resolve_without_index() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        store
            .create_or_update(Some("demo"), site_files())
            .await
            .unwrap();
        std::fs::remove_file(store.root().join("demo/index.html")).unwrap();

        assert!(matches!(
            store.resolve("demo", "/missing").await,
            Err(StoreError::FileNotFound(_))
        ));
        assert!(matches!(
            store.resolve("nosite", "/").await,
            Err(StoreError::SiteNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_refuses_escaping_paths() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        store
            .create_or_update(Some("demo"), site_files())
            .await
            .unwrap();
        store
            .create_or_update(Some("other"), site_files())
            .await
            .unwrap();

        for path in ["/../other/style.css", "/a/../../other/index.html", "/.."] {
            let result = store.resolve("demo", path).await;
            assert!(
                matches!(result, Err(StoreError::PathOutsideSite(_))),
                "{path} should be refused"
            );
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_uploads_of_same_name_all_succeed() {
        let tmp = TempDir::new().unwrap();
        let store = std::sync::Arc::new(store(&tmp));

        for round in 0..10 {
            let mut tasks = Vec::new();
            for writer in 0..8 {
                let store = std::sync::Arc::clone(&store);
                tasks.push(tokio::spawn(async move {
                    let body = format!("<p>round {round} writer {writer}</p>");
                    store
                        .create_or_update(Some("demo"), vec![UploadFile::new("index.html", body)])
                        .await
                }));
            }
            for task in tasks {
                let result = task.await.unwrap();
                assert!(result.is_ok(), "round {round}: {result:?}");
            }
        }

        let on_disk: Vec<String> = std::fs::read_dir(store.root().join("demo"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(on_disk, vec!["index.html"]);
        let content = std::fs::read_to_string(store.root().join("demo/index.html")).unwrap();
        assert!(content.starts_with("<p>round 9 writer "));
    }

    #[tokio::test]
    async fn test_leftover_partial_files_are_hidden() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        store
            .create_or_update(Some("demo"), site_files())
            .await
            .unwrap();
        let leftover = ".upload-a1b2c3.partial";
        std::fs::write(store.root().join("demo").join(leftover), "half").unwrap();

        assert_eq!(
            sorted_names(&store, "demo").await,
            vec!["index.html", "style.css"]
        );
        let sites = store.list_sites().await.unwrap();
        assert_eq!(sites[0].file_count, 2);

        let resolved = store
            .resolve("demo", &format!("/{leftover}"))
            .await
            .unwrap();
        assert!(resolved.fallback);
        assert!(resolved.path.ends_with("index.html"));
    }
}
