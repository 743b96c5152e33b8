// Server loop module
// Accepts connections until the shutdown future resolves

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use super::error::ServerError;
use crate::config::AppState;
use crate::logger;

const MIN_ACCEPT_DELAY: Duration = Duration::from_millis(5);
const MAX_ACCEPT_DELAY: Duration = Duration::from_secs(1);

/// Delay between retries after transient accept failures
///
/// Starts at 5ms and doubles up to 1s; a successful accept resets it.
#[derive(Debug, Default)]
struct AcceptBackoff {
    delay: Option<Duration>,
}

impl AcceptBackoff {
    fn next_delay(&mut self) -> Duration {
        let delay = self
            .delay
            .map_or(MIN_ACCEPT_DELAY, |d| (d * 2).min(MAX_ACCEPT_DELAY));
        self.delay = Some(delay);
        delay
    }

    fn reset(&mut self) {
        self.delay = None;
    }
}

/// Errors that clear up on their own: descriptor or buffer exhaustion and
/// connections dropped before we got to them
fn is_transient_accept_error(err: &io::Error) -> bool {
    if matches!(
        err.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    ) {
        return true;
    }

    #[cfg(unix)]
    if let Some(code) = err.raw_os_error() {
        return matches!(
            code,
            libc::EMFILE | libc::ENFILE | libc::ENOBUFS | libc::ENOMEM
        );
    }

    false
}

/// Decide what a failed accept means for the loop: a delay to wait out, or
/// the error that ends it
fn on_accept_error(err: io::Error, backoff: &mut AcceptBackoff) -> Result<Duration, ServerError> {
    if is_transient_accept_error(&err) {
        let delay = backoff.next_delay();
        logger::log_warning(&format!(
            "Failed to accept connection: {err}; retrying in {}ms",
            delay.as_millis()
        ));
        Ok(delay)
    } else {
        Err(ServerError::Listener(err))
    }
}

/// Accept connections until `shutdown` resolves.
///
/// Transient accept errors are retried with backoff; any other accept error
/// stops the loop and is returned. In-flight connections are left to finish
/// on their own tasks when the loop exits.
pub async fn serve<S>(listener: TcpListener, state: Arc<AppState>, shutdown: S) -> Result<(), ServerError>
where
    S: Future<Output = &'static str>,
{
    tokio::pin!(shutdown);
    let mut backoff = AcceptBackoff::default();

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        backoff.reset();
                        accept_connection(stream, peer_addr, &state);
                    }
                    Err(e) => {
                        let delay = on_accept_error(e, &mut backoff)?;
                        tokio::select! {
                            () = tokio::time::sleep(delay) => {}
                            signal = &mut shutdown => {
                                logger::log_shutdown(signal);
                                return Ok(());
                            }
                        }
                    }
                }
            }

            signal = &mut shutdown => {
                logger::log_shutdown(signal);
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let mut backoff = AcceptBackoff::default();
        let delays: Vec<u128> = (0..10).map(|_| backoff.next_delay().as_millis()).collect();
        assert_eq!(delays, vec![5, 10, 20, 40, 80, 160, 320, 640, 1000, 1000]);

        backoff.reset();
        assert_eq!(backoff.next_delay(), MIN_ACCEPT_DELAY);
    }

    #[cfg(unix)]
    #[test]
    fn test_descriptor_exhaustion_backs_off() {
        let mut backoff = AcceptBackoff::default();

        for code in [libc::EMFILE, libc::ENFILE, libc::ENOBUFS] {
            let err = io::Error::from_raw_os_error(code);
            assert!(is_transient_accept_error(&err), "{err}");
        }

        let first = on_accept_error(io::Error::from_raw_os_error(libc::EMFILE), &mut backoff).unwrap();
        let second = on_accept_error(io::Error::from_raw_os_error(libc::EMFILE), &mut backoff).unwrap();
        assert_eq!(first, Duration::from_millis(5));
        assert_eq!(second, Duration::from_millis(10));
    }

    #[test]
    fn test_aborted_connection_is_transient() {
        let err = io::Error::from(io::ErrorKind::ConnectionAborted);
        assert!(is_transient_accept_error(&err));
    }

    #[test]
    fn test_other_accept_errors_end_the_loop() {
        let mut backoff = AcceptBackoff::default();
        let err = io::Error::new(io::ErrorKind::InvalidInput, "listener closed");

        let result = on_accept_error(err, &mut backoff);
        assert!(matches!(result, Err(ServerError::Listener(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_bad_descriptor_is_fatal() {
        let mut backoff = AcceptBackoff::default();
        let err = io::Error::from_raw_os_error(libc::EBADF);
        assert!(!is_transient_accept_error(&err));
        assert!(on_accept_error(err, &mut backoff).is_err());
    }
}
