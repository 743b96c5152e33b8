// Connection handling module
// Serves one accepted TCP connection on its own task

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Accept a connection, enforcing the optional connection cap.
///
/// The counter is incremented before the limit check so concurrent accepts
/// cannot both slip under the cap.
pub fn accept_connection(stream: TcpStream, peer_addr: SocketAddr, state: &Arc<AppState>) {
    let prev_count = state.active_connections.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            state.active_connections.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    logger::log_connection_accepted(&peer_addr);
    handle_connection(stream, peer_addr, Arc::clone(state));
}

/// Serve HTTP/1.1 on the stream in a spawned task.
///
/// Without `performance.connection_timeout` a connection lives as long as
/// the client keeps it open.
fn handle_connection(stream: TcpStream, peer_addr: SocketAddr, state: Arc<AppState>) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let mut builder = http1::Builder::new();
        builder.keep_alive(state.config.performance.keep_alive);

        let timeout = state
            .config
            .performance
            .connection_timeout
            .map(Duration::from_secs);

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                handler::handle_request(req, Arc::clone(&service_state), Some(peer_addr))
            }),
        );

        let result = match timeout {
            Some(limit) => match tokio::time::timeout(limit, conn).await {
                Ok(result) => result,
                Err(_) => {
                    logger::log_warning(&format!(
                        "Connection from {peer_addr} timed out after {} seconds",
                        limit.as_secs()
                    ));
                    Ok(())
                }
            },
            None => conn.await,
        };

        if let Err(err) = result {
            logger::log_connection_error(&err);
        }

        state.active_connections.fetch_sub(1, Ordering::SeqCst);
    });
}
