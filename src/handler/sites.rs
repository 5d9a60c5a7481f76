//! Hosted site serving module
//!
//! Resolves `/sites/{subdomain}/{path}` through the site store and sends the
//! file with an `ETag`, answering conditional requests with 304.

use crate::config::AppState;
use crate::handler::router::RequestContext;
use crate::http::{self, cache};
use crate::logger;
use crate::store::{ErrorKind, StoreError};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use percent_encoding::percent_decode_str;
use tokio::fs;

/// Path prefix under which sites are served
pub const SITES_PREFIX: &str = "/sites/";

/// Split a request path into `(subdomain, path inside the site)`
///
/// `/sites/demo/css/app.css` gives `("demo", "/css/app.css")` and
/// `/sites/demo` gives `("demo", "")`.
pub fn split_site_path(path: &str) -> Option<(&str, &str)> {
    let rest = path.strip_prefix(SITES_PREFIX)?;
    let (subdomain, inner) = match rest.find('/') {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };
    if subdomain.is_empty() {
        None
    } else {
        Some((subdomain, inner))
    }
}

/// Serve one file of a hosted site
pub async fn serve_site(
    ctx: &RequestContext<'_>,
    state: &AppState,
    subdomain: &str,
    site_path: &str,
) -> Response<Full<Bytes>> {
    // Relative links in index.html need the trailing slash
    if site_path.is_empty() {
        return http::build_redirect_response(&format!("{SITES_PREFIX}{subdomain}/"));
    }

    // Containment is checked by the store on the decoded form
    let Ok(site_path) = percent_decode_str(site_path).decode_utf8() else {
        logger::log_warning(&format!("Undecodable request path: {}", ctx.path));
        return http::build_404_response();
    };

    let resolved = match state.store.resolve(subdomain, &site_path).await {
        Ok(resolved) => resolved,
        Err(e) => return site_error_response(ctx, &e),
    };
    if resolved.fallback {
        tracing::debug!("SPA fallback for {subdomain}{site_path}");
    }

    let content = match fs::read(&resolved.path).await {
        Ok(c) => Bytes::from(c),
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {e}",
                resolved.path.display()
            ));
            return http::build_text_response(500, "500 Internal Server Error");
        }
    };

    let max_age = state.config.http.cache_max_age;
    let etag = cache::generate_etag(&content);
    if cache::check_etag_match(ctx.if_none_match.as_deref(), &etag) {
        return http::build_304_response(&etag, max_age);
    }

    http::build_file_response(content, resolved.content_type, &etag, max_age, ctx.is_head)
}

fn site_error_response(ctx: &RequestContext<'_>, err: &StoreError) -> Response<Full<Bytes>> {
    match err.kind() {
        ErrorKind::NotFound => {
            if matches!(err, StoreError::PathOutsideSite(_)) {
                logger::log_warning(&format!("Path traversal attempt blocked: {}", ctx.path));
            }
            http::build_404_response()
        }
        _ => {
            logger::log_error(&format!("Failed to serve {}: {err}", ctx.path));
            http::build_text_response(500, "500 Internal Server Error")
        }
    }
}
