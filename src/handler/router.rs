//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method and body-size checks,
//! then dispatch to health, API or site serving. Generic over the body type
//! so tests can drive it without a socket.

use crate::api;
use crate::config::AppState;
use crate::handler::sites;
use crate::http;
use crate::logger;
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::HeaderValue;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<String>,
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + Send + 'static,
{
    let mut response = route_request(req, &state).await?;

    let headers = response.headers_mut();
    if let Ok(server) = HeaderValue::from_str(&state.config.http.server_name) {
        headers.insert("Server", server);
    }
    if state.config.http.enable_cors {
        headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    }

    Ok(response)
}

async fn route_request<B>(
    req: Request<B>,
    state: &Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + Send + 'static,
{
    // 1. Preflight
    if req.method() == Method::OPTIONS {
        return Ok(http::build_options_response(state.config.http.enable_cors));
    }

    // 2. Check body size before reading anything
    if let Some(resp) = check_body_size(&req, state.config.http.max_body_size) {
        return Ok(resp);
    }

    let path = req.uri().path().to_string();

    // 3. Health probe
    if path == "/health" {
        return match *req.method() {
            Method::GET | Method::HEAD => api::handle_health(),
            _ => Ok(http::build_405_response("GET, HEAD, OPTIONS")),
        };
    }

    // 4. Management API
    if path.starts_with(api::API_PREFIX) {
        return api::handle_api(req, Arc::clone(state)).await;
    }

    // 5. Hosted sites
    if let Some((subdomain, site_path)) = sites::split_site_path(&path) {
        if !matches!(*req.method(), Method::GET | Method::HEAD) {
            logger::log_warning(&format!("Method not allowed: {} {path}", req.method()));
            return Ok(http::build_405_response("GET, HEAD, OPTIONS"));
        }
        let ctx = RequestContext {
            path: &path,
            is_head: req.method() == Method::HEAD,
            if_none_match: req
                .headers()
                .get("if-none-match")
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string),
        };
        return Ok(sites::serve_site(&ctx, state, subdomain, site_path).await);
    }

    api::error_response(404, "Not Found")
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_warning(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                api::error_response(
                    413,
                    &format!("Request body too large (max {max_body_size} bytes)"),
                )
                .ok()
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}
