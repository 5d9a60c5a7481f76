// Multipart upload parsing
// Reads the whole form before anything is handed to the store, so a rejected
// batch never reaches the disk.

use futures_util::TryStreamExt;
use http_body_util::BodyStream;
use hyper::body::{Body, Bytes};
use hyper::Request;
use multer::{Constraints, Multipart, SizeLimit};

use crate::store::{StoreError, UploadFile, UploadLimits};

/// Form field carrying the target subdomain
pub const SUBDOMAIN_FIELD: &str = "subdomain";

/// Parsed upload form
#[derive(Debug, Default)]
pub struct UploadForm {
    pub subdomain: Option<String>,
    pub files: Vec<UploadFile>,
}

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("Expected a multipart/form-data request")]
    NotMultipart,

    #[error("Malformed multipart body: {0}")]
    Malformed(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl FormError {
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotMultipart | Self::Malformed(_) => 400,
            Self::Store(e) => e.kind().status_code(),
        }
    }
}

impl From<multer::Error> for FormError {
    fn from(err: multer::Error) -> Self {
        match err {
            multer::Error::FieldSizeExceeded { limit, field_name } => {
                Self::Store(StoreError::OversizeRequest(format!(
                    "File too large: {} (max {limit} bytes)",
                    field_name.as_deref().unwrap_or("unnamed field")
                )))
            }
            multer::Error::StreamSizeExceeded { limit } => Self::Store(
                StoreError::OversizeRequest(format!("Request body too large (max {limit} bytes)")),
            ),
            other => Self::Malformed(other.to_string()),
        }
    }
}

/// Read a `multipart/form-data` upload
///
/// Every part with a filename is a file; the `subdomain` text part names the
/// site. Parts with an empty filename (an unfilled file input) and unknown
/// text parts are skipped. A file part beyond `limits.max_files` stops the
/// read before its content is buffered; extension and index rules are left to
/// the store.
pub async fn read_upload_form<B>(
    req: Request<B>,
    limits: UploadLimits,
    max_body_size: u64,
) -> Result<UploadForm, FormError>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + Send + 'static,
{
    let boundary = req
        .headers()
        .get(hyper::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or(FormError::NotMultipart)?;

    let stream = BodyStream::new(req.into_body())
        .try_filter_map(|frame| async move { Ok::<_, B::Error>(frame.into_data().ok()) });
    let constraints = Constraints::new().size_limit(
        SizeLimit::new()
            .whole_stream(max_body_size)
            .per_field(limits.max_file_size),
    );
    let mut multipart = Multipart::with_constraints(stream, boundary, constraints);

    let mut form = UploadForm::default();
    while let Some(field) = multipart.next_field().await? {
        match field.file_name().map(ToString::to_string) {
            Some(file_name) if !file_name.is_empty() => {
                if form.files.len() >= limits.max_files {
                    return Err(FormError::Store(StoreError::OversizeRequest(format!(
                        "Too many files (max {})",
                        limits.max_files
                    ))));
                }
                let content_type = field
                    .content_type()
                    .map_or_else(|| "application/octet-stream".to_string(), ToString::to_string);
                let content = field.bytes().await?;
                form.files.push(UploadFile {
                    original_name: file_name,
                    content,
                    content_type,
                });
            }
            Some(_) => {}
            None if field.name() == Some(SUBDOMAIN_FIELD) => {
                form.subdomain = Some(field.text().await?);
            }
            None => {}
        }
    }

    Ok(form)
}
