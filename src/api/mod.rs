// API module entry
// JSON management API for hosted sites

mod handlers;
mod response;
mod types;
pub mod upload;

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

use crate::config::AppState;

pub use handlers::handle_health;
pub use response::error_response;

/// Prefix shared by every management route
pub const API_PREFIX: &str = "/api/";

/// API route handler
///
/// Dispatches `/api/*` requests to handler functions based on path and method
pub async fn handle_api<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + Send + 'static,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let route = path
        .strip_prefix(API_PREFIX)
        .unwrap_or_default()
        .trim_end_matches('/');
    let segments: Vec<&str> = route.split('/').collect();

    match (method, segments.as_slice()) {
        (Method::POST, ["upload"]) => handlers::handle_upload(req, &state).await,
        (Method::GET | Method::HEAD, ["files", subdomain]) => {
            handlers::handle_list_files(&state, subdomain).await
        }
        (Method::GET | Method::HEAD, ["sites"]) => handlers::handle_list_sites(&state).await,
        (Method::DELETE, ["sites", subdomain]) => {
            handlers::handle_delete_site(&state, subdomain).await
        }
        // Known routes, wrong method
        (_, ["upload"]) => response::method_not_allowed("POST, OPTIONS"),
        (_, ["files", _] | ["sites"]) => response::method_not_allowed("GET, HEAD, OPTIONS"),
        (_, ["sites", _]) => response::method_not_allowed("DELETE, OPTIONS"),
        // Unknown route
        _ => response::not_found(),
    }
}
