// Server module entry
// Binds the listener, announces it, and runs the accept loop

pub mod connection;
pub mod error;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the file is mounted as `server_loop`
#[path = "loop.rs"]
pub mod server_loop;

use std::sync::Arc;

pub use error::ServerError;
pub use listener::bind_listener;
pub use server_loop::serve;

use crate::config::AppState;
use crate::logger;

/// Bind the configured address and serve until a shutdown signal.
///
/// A bind failure, or an accept error that is not transient, is returned to
/// the caller, which treats it as fatal.
pub async fn run(state: Arc<AppState>) -> Result<(), ServerError> {
    let addr = state
        .config
        .get_socket_addr()
        .map_err(ServerError::InvalidAddress)?;

    let listener = bind_listener(addr, state.config.server.backlog)?;
    let local_addr = listener.local_addr()?;
    logger::log_server_start(&local_addr, &state.config);

    serve(listener, state, signal::shutdown_signal()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::handler::build_route_table;
    use http_body_util::{BodyExt, Full};
    use hyper::body::Bytes;
    use hyper::{Method, Request, StatusCode};
    use hyper_util::client::legacy::Client;
    use hyper_util::rt::TokioExecutor;
    use std::net::SocketAddr;
    use tokio::sync::oneshot;

    fn test_config() -> Config {
        let mut config = Config::load_from("definitely-missing-config").unwrap();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        config.logging.access_log = false;
        config
    }

    async fn start_server(config: Config) -> (SocketAddr, oneshot::Sender<()>) {
        let routes = build_route_table(&config.routing).unwrap();
        let addr = config.get_socket_addr().unwrap();
        let backlog = config.server.backlog;
        let state = Arc::new(AppState::new(config, routes));

        let listener = bind_listener(addr, backlog).unwrap();
        let local_addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(serve(listener, state, async move {
            let _ = rx.await;
            "test"
        }));
        (local_addr, tx)
    }

    async fn call(addr: SocketAddr, method: Method, path: &str, body: &str) -> (StatusCode, String) {
        let client = Client::builder(TokioExecutor::new()).build_http::<Full<Bytes>>();
        let req = Request::builder()
            .method(method)
            .uri(format!("http://{addr}{path}"))
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap();
        let resp = client.request(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_end_to_end() {
        let (addr, stop) = start_server(test_config()).await;

        let (status, body) = call(addr, Method::GET, "/hello", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Hello to you too!");

        let (status, body) = call(addr, Method::GET, "/print/hey%20there", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "hey there");

        let (status, body) = call(addr, Method::GET, "/request-info/abc?q=1&q=2", "").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["query_parameters"]["q"], serde_json::json!(["1", "2"]));
        assert_eq!(json["dynamic_url_parameters"]["params"], "abc");
        assert_eq!(json["host"], addr.to_string());

        let (status, _) = call(addr, Method::GET, "/nonexistent", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // The server is still alive after a miss
        let (status, _) = call(addr, Method::GET, "/system", "").await;
        assert_eq!(status, StatusCode::OK);

        let _ = stop.send(());
    }

    #[tokio::test]
    async fn test_concurrent_requests() {
        let (addr, stop) = start_server(test_config()).await;

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                tokio::spawn(async move {
                    call(addr, Method::GET, &format!("/print/item-{i}"), "").await
                })
            })
            .collect();

        for (i, task) in tasks.into_iter().enumerate() {
            let (status, body) = task.await.unwrap();
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, format!("item-{i}"));
        }

        let _ = stop.send(());
    }

    #[tokio::test]
    async fn test_run_fails_when_port_taken() {
        let holder = bind_listener("127.0.0.1:0".parse().unwrap(), 16).unwrap();
        let taken = holder.local_addr().unwrap();

        let mut config = test_config();
        config.server.port = taken.port();
        let routes = build_route_table(&config.routing).unwrap();
        let state = Arc::new(AppState::new(config, routes));

        let err = run(state).await.unwrap_err();
        assert!(matches!(err, ServerError::Bind { .. }));
    }

    #[tokio::test]
    async fn test_run_rejects_bad_address() {
        let mut config = test_config();
        config.server.host = "not-an-ip".to_string();
        let routes = build_route_table(&config.routing).unwrap();
        let state = Arc::new(AppState::new(config, routes));

        let err = run(state).await.unwrap_err();
        assert!(matches!(err, ServerError::InvalidAddress(_)));
    }
}
