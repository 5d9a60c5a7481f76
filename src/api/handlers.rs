// Management API handlers module

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use std::sync::Arc;

use super::response::{error_response, json_response, store_error_response};
use super::types::{
    DeleteResponse, FileInfo, FilesResponse, HealthResponse, SiteInfo, SitesResponse,
    UploadResponse,
};
use super::upload;
use crate::config::AppState;
use crate::logger;

/// Liveness probe
pub fn handle_health() -> Result<Response<Full<Bytes>>, Infallible> {
    json_response(
        StatusCode::OK,
        &HealthResponse {
            status: "ok",
            timestamp: chrono::Utc::now().to_rfc3339(),
        },
    )
}

/// Create or update a site from a multipart form
pub async fn handle_upload<B>(
    req: Request<B>,
    state: &Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + Send + 'static,
{
    let form = match upload::read_upload_form(
        req,
        state.store.limits(),
        state.config.http.max_body_size,
    )
    .await
    {
        Ok(form) => form,
        Err(upload::FormError::Store(e)) => {
            return store_error_response(&e, "POST", "/api/upload");
        }
        Err(e) => {
            let status = e.status_code();
            logger::log_rejected("POST", "/api/upload", status, &e.to_string());
            return error_response(status, &e.to_string());
        }
    };

    match state
        .store
        .create_or_update(form.subdomain.as_deref(), form.files)
        .await
    {
        Ok(receipt) => {
            logger::log_site_deployed(&receipt.subdomain, receipt.files.len());
            json_response(StatusCode::OK, &UploadResponse::from(receipt))
        }
        Err(e) => store_error_response(&e, "POST", "/api/upload"),
    }
}

pub async fn handle_list_files(
    state: &Arc<AppState>,
    subdomain: &str,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match state.store.list_files(subdomain).await {
        Ok(files) => json_response(
            StatusCode::OK,
            &FilesResponse {
                files: files.into_iter().map(FileInfo::from).collect(),
            },
        ),
        Err(e) => store_error_response(&e, "GET", &format!("/api/files/{subdomain}")),
    }
}

pub async fn handle_delete_site(
    state: &Arc<AppState>,
    subdomain: &str,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match state.store.delete_site(subdomain).await {
        Ok(()) => {
            logger::log_site_deleted(subdomain);
            json_response(
                StatusCode::OK,
                &DeleteResponse {
                    success: true,
                    message: format!("Site '{subdomain}' deleted"),
                },
            )
        }
        Err(e) => store_error_response(&e, "DELETE", &format!("/api/sites/{subdomain}")),
    }
}

pub async fn handle_list_sites(
    state: &Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match state.store.list_sites().await {
        Ok(sites) => json_response(
            StatusCode::OK,
            &SitesResponse {
                total: sites.len(),
                sites: sites.into_iter().map(SiteInfo::from).collect(),
            },
        ),
        Err(e) => store_error_response(&e, "GET", "/api/sites"),
    }
}
