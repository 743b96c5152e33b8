//! Inbound request module
//!
//! An owned, immutable snapshot of one HTTP request: method, decoded path,
//! query parameters, headers and the fully read body.

use std::borrow::Cow;
use std::collections::BTreeMap;

use hyper::body::Bytes;
use hyper::http::request::Parts;
use hyper::Method;
use serde_json::{Map, Value};

/// Name → every value seen for it, in arrival order
pub type MultiMap = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    /// URL path exactly as sent, used for route matching
    pub raw_path: String,
    /// Percent-decoded URL path
    pub path: String,
    pub query: MultiMap,
    /// Authority of an absolute-form target, otherwise the Host header
    pub host: String,
    /// Headers keyed by canonical name (`User-Agent`); Host is kept in `host`
    pub headers: MultiMap,
    pub body: Bytes,
}

impl InboundRequest {
    pub fn from_parts(parts: &Parts, body: Bytes) -> Self {
        let raw_path = parts.uri.path();
        let path = urlencoding::decode(raw_path)
            .map_or_else(|_| raw_path.to_string(), Cow::into_owned);

        let query = parts.uri.query().map(parse_query).unwrap_or_default();

        let host = parts.uri.authority().map_or_else(
            || {
                parts
                    .headers
                    .get(hyper::header::HOST)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string()
            },
            ToString::to_string,
        );

        let mut headers = MultiMap::new();
        for (name, value) in &parts.headers {
            if name == hyper::header::HOST {
                continue;
            }
            headers
                .entry(canonical_header_key(name.as_str()))
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        }

        Self {
            method: parts.method.clone(),
            raw_path: raw_path.to_string(),
            path,
            query,
            host,
            headers,
            body,
        }
    }

    /// Decode the body as a JSON object
    ///
    /// Only the first JSON value is read; anything after it is ignored. A body
    /// that is empty, malformed or not an object yields an empty map.
    pub fn json_object(&self) -> Map<String, Value> {
        serde_json::Deserializer::from_slice(&self.body)
            .into_iter::<Map<String, Value>>()
            .next()
            .and_then(Result::ok)
            .unwrap_or_default()
    }
}

/// Parse `a=1&a=2&b` into `{a: [1, 2], b: [""]}`
pub fn parse_query(raw: &str) -> MultiMap {
    let mut query = MultiMap::new();
    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        query
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    query
}

/// `content-type` → `Content-Type`, `x_odd` → `X_odd`
///
/// Names holding anything outside the HTTP token characters are returned as-is.
pub fn canonical_header_key(name: &str) -> String {
    if !name.bytes().all(is_token_byte) {
        return name.to_string();
    }

    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}

/// `tchar` from RFC 7230 section 3.2.6
const fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_'
                | b'`' | b'|' | b'~'
        )
}
