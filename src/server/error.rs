//! Server error types.

use std::net::SocketAddr;

use thiserror::Error;

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid listen address: {0}")]
    InvalidAddress(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("listener error: {0}")]
    Listener(#[from] std::io::Error),
}
