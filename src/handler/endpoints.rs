//! Endpoint handlers
//!
//! Each handler reads only its own request and builds only its own response.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use serde::Serialize;
use serde_json::{Map, Value};

use super::request::{InboundRequest, MultiMap};
use crate::http;
use crate::routing::PathParams;

pub const GREETING: &str = "Hello to you too!";

/// `GET /hello`: constant greeting
pub fn hello(_req: &InboundRequest, _params: &PathParams) -> Response<Full<Bytes>> {
    http::build_text_response(GREETING)
}

#[derive(Debug, Serialize)]
struct EchoBody {
    endpoint: &'static str,
    function: &'static str,
    what_did_i_send: Map<String, Value>,
}

/// Second `GET /hello` binding: echoes the decoded JSON body
pub fn post_hello(req: &InboundRequest, _params: &PathParams) -> Response<Full<Bytes>> {
    http::build_json_response(&EchoBody {
        endpoint: "hello",
        function: "postHello",
        what_did_i_send: req.json_object(),
    })
}

/// `GET /print/{what_to_print}`
pub fn print(_req: &InboundRequest, params: &PathParams) -> Response<Full<Bytes>> {
    let text = params.get("what_to_print").cloned().unwrap_or_default();
    http::build_text_response(text)
}

#[derive(Debug, Serialize)]
struct SystemInfo {
    operating_system: &'static str,
    system_architecture: &'static str,
}

/// `GET /system`: OS and architecture of the host running the server
pub fn system_info(_req: &InboundRequest, _params: &PathParams) -> Response<Full<Bytes>> {
    http::build_json_response(&SystemInfo {
        operating_system: std::env::consts::OS,
        system_architecture: std::env::consts::ARCH,
    })
}

#[derive(Debug, Serialize)]
struct RequestInfo<'a> {
    dynamic_url_parameters: &'a PathParams,
    headers: &'a MultiMap,
    host: &'a str,
    http_method: &'a str,
    path: &'a str,
    query_parameters: &'a MultiMap,
}

/// `* /request-info/{params}`: dumps the request as the server saw it
pub fn request_info(req: &InboundRequest, params: &PathParams) -> Response<Full<Bytes>> {
    http::build_json_response(&RequestInfo {
        dynamic_url_parameters: params,
        headers: &req.headers,
        host: &req.host,
        http_method: req.method.as_str(),
        path: &req.path,
        query_parameters: &req.query,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use hyper::{Method, Request, StatusCode};

    fn inbound(method: Method, uri: &str, body: &'static str) -> InboundRequest {
        let (parts, ()) = Request::builder()
            .method(method)
            .uri(uri)
            .header("Host", "localhost:5000")
            .header("User-Agent", "test-agent")
            .body(())
            .unwrap()
            .into_parts();
        InboundRequest::from_parts(&parts, Bytes::from_static(body.as_bytes()))
    }

    fn params(pairs: &[(&str, &str)]) -> PathParams {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    async fn body_json(resp: Response<Full<Bytes>>) -> Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(resp: Response<Full<Bytes>>) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_hello() {
        let resp = hello(&inbound(Method::GET, "/hello", ""), &PathParams::new());
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "Hello to you too!");
    }

    #[tokio::test]
    async fn test_post_hello_echoes_body() {
        let req = inbound(Method::GET, "/hello", r#"{"name":"gopher","tags":["a","b"]}"#);
        let json = body_json(post_hello(&req, &PathParams::new())).await;
        assert_eq!(
            json,
            serde_json::json!({
                "endpoint": "hello",
                "function": "postHello",
                "what_did_i_send": {"name": "gopher", "tags": ["a", "b"]}
            })
        );
    }

    #[tokio::test]
    async fn test_post_hello_malformed_body_is_empty() {
        let req = inbound(Method::GET, "/hello", "{not json");
        let resp = post_hello(&req, &PathParams::new());
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["what_did_i_send"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_print() {
        let req = inbound(Method::GET, "/print/x", "");
        let resp = print(&req, &params(&[("what_to_print", "a b&c")]));
        assert_eq!(resp.headers()["content-type"], http::response::TEXT_PLAIN);
        assert_eq!(body_text(resp).await, "a b&c");
    }

    #[tokio::test]
    async fn test_system_info() {
        let json = body_json(system_info(&inbound(Method::GET, "/system", ""), &PathParams::new())).await;
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["operating_system"], std::env::consts::OS);
        assert_eq!(obj["system_architecture"], std::env::consts::ARCH);
    }

    #[tokio::test]
    async fn test_request_info() {
        let req = inbound(Method::POST, "/request-info/abc?q=1&q=2", "");
        let json = body_json(request_info(&req, &params(&[("params", "abc")]))).await;

        assert_eq!(json["dynamic_url_parameters"], serde_json::json!({"params": "abc"}));
        assert_eq!(json["path"], "/request-info/abc");
        assert_eq!(json["query_parameters"]["q"], serde_json::json!(["1", "2"]));
        assert_eq!(json["http_method"], "POST");
        assert_eq!(json["host"], "localhost:5000");
        assert_eq!(json["headers"]["User-Agent"], serde_json::json!(["test-agent"]));
        assert_eq!(json.as_object().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_request_info_key_order() {
        let req = inbound(Method::GET, "/request-info/abc", "");
        let text = body_text(request_info(&req, &params(&[("params", "abc")]))).await;
        let keys = [
            "\"dynamic_url_parameters\"",
            "\"headers\"",
            "\"host\"",
            "\"http_method\"",
            "\"path\"",
            "\"query_parameters\"",
        ];
        let positions: Vec<usize> = keys.iter().map(|k| text.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(text.ends_with('\n'));
    }
}
