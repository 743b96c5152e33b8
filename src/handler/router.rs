//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: body limits, route resolution,
//! handler invocation and access logging.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, CONTENT_LENGTH, REFERER, SERVER, USER_AGENT};
use hyper::{Request, Response};

use super::request::InboundRequest;
use crate::config::AppState;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::routing::Resolution;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: Option<SocketAddr>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let (parts, body) = req.into_parts();
    let max_body_size = state.config.http.max_body_size;

    let mut entry = AccessLogEntry::new(
        peer_addr.map_or_else(|| "-".to_string(), |a| a.ip().to_string()),
        parts.method.to_string(),
        parts.uri.path().to_string(),
    );
    entry.query = parts.uri.query().map(ToString::to_string);
    entry.http_version = version_label(parts.version).to_string();
    entry.referer = header_string(&parts.headers, REFERER);
    entry.user_agent = header_string(&parts.headers, USER_AGENT);

    let response = if exceeds_body_limit(&parts.headers, max_body_size) {
        http::build_413_response()
    } else {
        match read_body(body, max_body_size).await {
            Ok(bytes) => {
                let inbound = InboundRequest::from_parts(&parts, bytes);
                dispatch(&inbound, &state, &mut entry)
            }
            Err(resp) => resp,
        }
    };

    Ok(finish(response, &state, entry, started))
}

/// Resolve the route and run its handler
fn dispatch(
    req: &InboundRequest,
    state: &AppState,
    entry: &mut AccessLogEntry,
) -> Response<Full<Bytes>> {
    match state.routes.resolve(&req.method, &req.raw_path) {
        Resolution::Matched { binding, params } => {
            entry.route = Some(binding.pattern.to_string());
            logger::log_debug(&format!(
                "{} {} -> {}",
                req.method, req.path, binding.handler.name
            ));
            (binding.handler.handle)(req, &params)
        }
        Resolution::MethodNotAllowed(allowed) => http::build_405_response(&allowed),
        Resolution::NotFound => http::build_404_response(),
    }
}

/// Reject early when the declared Content-Length is over the limit
fn exceeds_body_limit(headers: &hyper::HeaderMap, max_body_size: u64) -> bool {
    let Some(value) = headers.get(CONTENT_LENGTH) else {
        return false;
    };
    match value.to_str().ok().and_then(|s| s.parse::<u64>().ok()) {
        Some(size) if size > max_body_size => {
            logger::log_warning(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            true
        }
        Some(_) => false,
        None => {
            logger::log_warning("Invalid Content-Length value, skipping size check");
            false
        }
    }
}

/// Read the whole body, enforcing the size limit on the bytes actually sent
async fn read_body<B>(body: B, max_body_size: u64) -> Result<Bytes, Response<Full<Bytes>>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            logger::log_warning(&format!("Request body exceeded {max_body_size} bytes"));
            Err(http::build_413_response())
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            Err(http::build_400_response())
        }
    }
}

/// Stamp common headers and write the access log line
fn finish(
    mut response: Response<Full<Bytes>>,
    state: &AppState,
    mut entry: AccessLogEntry,
    started: Instant,
) -> Response<Full<Bytes>> {
    if let Ok(value) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, value);
    }

    if state.config.logging.access_log {
        entry.status = response.status().as_u16();
        entry.body_bytes = usize::try_from(response.body().size_hint().exact().unwrap_or(0))
            .unwrap_or(usize::MAX);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    response
}

fn header_string(headers: &hyper::HeaderMap, name: hyper::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn version_label(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_09 => "0.9",
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        hyper::Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
