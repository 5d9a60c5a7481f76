// API response utility functions module

use crate::logger;
use crate::store::{ErrorKind, StoreError};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::convert::Infallible;

use super::types::ErrorResponse;

/// Build JSON response
#[allow(clippy::unnecessary_wraps)]
pub fn json_response<T: Serialize>(
    status: StatusCode,
    body: &T,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let json = match serde_json::to_string_pretty(body) {
        Ok(j) => j,
        Err(e) => {
            logger::log_error(&format!("Failed to serialize response: {e}"));
            return Ok(Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .body(Full::new(Bytes::from(
                    r#"{"error":"Internal server error"}"#,
                )))
                .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Error")))));
        }
    };

    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            logger::log_error(&format!("Failed to build response: {e}"));
            Response::new(Full::new(Bytes::from("Error")))
        }))
}

/// `{"error": message}` with the given status
pub fn error_response(status: u16, message: &str) -> Result<Response<Full<Bytes>>, Infallible> {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    json_response(
        status,
        &ErrorResponse {
            error: message.to_string(),
        },
    )
}

/// Report a store failure, logging server-side faults as errors
pub fn store_error_response(
    err: &StoreError,
    method: &str,
    path: &str,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let status = err.kind().status_code();
    if err.kind() == ErrorKind::Storage {
        logger::log_error(&format!("{method} {path}: {err}"));
        return error_response(status, "Storage failure");
    }
    logger::log_rejected(method, path, status, &err.to_string());
    error_response(status, &err.to_string())
}

/// 404 Not Found response
pub fn not_found() -> Result<Response<Full<Bytes>>, Infallible> {
    error_response(404, "Not Found")
}

/// 405 Method Not Allowed response with `Allow` header
pub fn method_not_allowed(allow: &'static str) -> Result<Response<Full<Bytes>>, Infallible> {
    let mut resp = error_response(405, "Method Not Allowed")?;
    resp.headers_mut()
        .insert("Allow", hyper::header::HeaderValue::from_static(allow));
    Ok(resp)
}
