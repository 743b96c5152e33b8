// Listener module
// Creates the TCP listener the server accepts on

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;

use super::error::ServerError;

/// Create a `TcpListener` bound to `addr`.
///
/// `SO_REUSEADDR` lets a restarted server rebind while old sockets sit in
/// `TIME_WAIT`; it does not let two live listeners share the port, so a port
/// already in use fails with `ServerError::Bind`.
///
/// # Arguments
///
/// * `addr` - The socket address to bind to
/// * `backlog` - Pending connection queue length
pub fn bind_listener(addr: std::net::SocketAddr, backlog: i32) -> Result<TcpListener, ServerError> {
    let bind = |source| ServerError::Bind { addr, source };

    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP)).map_err(bind)?;

    #[cfg(unix)]
    socket.set_reuse_address(true).map_err(bind)?;

    socket.set_nonblocking(true).map_err(bind)?;
    socket.bind(&addr.into()).map_err(bind)?;
    socket.listen(backlog).map_err(bind)?;

    let std_listener: std::net::TcpListener = socket.into();
    Ok(TcpListener::from_std(std_listener)?)
}
