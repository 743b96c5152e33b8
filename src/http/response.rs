//! HTTP response building module
//!
//! Builders for the text, JSON and error responses the server emits.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Response, StatusCode};
use serde::Serialize;

pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
pub const APPLICATION_JSON: &str = "application/json";

/// Build 200 plain-text response
pub fn build_text_response(body: impl Into<String>) -> Response<Full<Bytes>> {
    build_response(StatusCode::OK, TEXT_PLAIN, Bytes::from(body.into()))
}

/// Build 200 JSON response
///
/// The body is compact JSON followed by a newline, keys in sorted order.
pub fn build_json_response<T: Serialize>(value: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(value) {
        Ok(mut json) => {
            json.push(b'\n');
            build_response(StatusCode::OK, APPLICATION_JSON, Bytes::from(json))
        }
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            build_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                APPLICATION_JSON,
                Bytes::from_static(b"{\"error\":\"Internal server error\"}\n"),
            )
        }
    }
}

/// Build 400 Bad Request response
pub fn build_400_response() -> Response<Full<Bytes>> {
    build_response(
        StatusCode::BAD_REQUEST,
        TEXT_PLAIN,
        Bytes::from_static(b"400 Bad Request"),
    )
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    build_response(
        StatusCode::NOT_FOUND,
        TEXT_PLAIN,
        Bytes::from_static(b"404 page not found\n"),
    )
}

/// Build 405 Method Not Allowed response listing the accepted methods
pub fn build_405_response(allowed: &[Method]) -> Response<Full<Bytes>> {
    let allow = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header("Content-Type", TEXT_PLAIN)
        .header("Allow", allow)
        .body(Full::new(Bytes::from_static(b"405 Method Not Allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(Full::new(Bytes::from_static(b"405 Method Not Allowed")))
        })
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    build_response(
        StatusCode::PAYLOAD_TOO_LARGE,
        TEXT_PLAIN,
        Bytes::from_static(b"413 Payload Too Large"),
    )
}

fn build_response(status: StatusCode, content_type: &str, body: Bytes) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", content_type)
        .body(Full::new(body.clone()))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(body))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
