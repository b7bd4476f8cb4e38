//! Accept loop.
//!
//! One task per connection, HTTP/1.1 via hyper with the router adapted as a
//! hyper service. Timeouts:
//! - full request: `TimeoutLayer` on the router
//! - header read / stalled write / idle keep-alive: [`conn::watchdog`]
//!
//! hyper's own `header_read_timeout` is not used: it also runs while a
//! kept-alive connection waits for its next request, which would cap the idle
//! timeout at the header timeout.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::{service_fn, Service};
use hyper::Request;
use hyper_util::rt::TokioIo;
use hyper_util::service::TowerToHyperService;
use tokio::net::{TcpListener, TcpStream};

use metrixd_core::error::{MetrixdError, Result};

use super::conn::{self, Activity, Expiry, TrackedStream};
use crate::config::ServerTimeouts;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Resolve `host:port` (or a bare `:port`, meaning all interfaces) to a socket address.
pub async fn resolve_listen_address(addr: &str) -> Result<SocketAddr> {
    let addr = addr.trim();
    let candidate = if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    };

    if let Ok(sa) = candidate.parse::<SocketAddr>() {
        return Ok(sa);
    }

    tokio::net::lookup_host(candidate)
        .await
        .map_err(|e| MetrixdError::InvalidAddress(format!("{addr}: {e}")))?
        .next()
        .ok_or_else(|| MetrixdError::InvalidAddress(format!("{addr}: no addresses resolved")))
}

/// Errors after which the listener is still usable.
fn accept_error_is_transient(e: &io::Error) -> bool {
    if matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
    ) {
        return true;
    }
    // EMFILE, ENFILE, ENOBUFS, ENOMEM
    matches!(e.raw_os_error(), Some(24 | 23 | 105 | 12))
}

/// Serve `router` on `listener` until the listener fails.
pub async fn serve(listener: TcpListener, router: Router, timeouts: ServerTimeouts) -> Result<()> {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(x) => x,
            Err(e) if accept_error_is_transient(&e) => {
                tracing::warn!(error = %e, "accept failed; retrying");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
            Err(e) => return Err(MetrixdError::Serve(e)),
        };

        let router = router.clone();
        tokio::spawn(async move {
            serve_connection(stream, peer, router, timeouts).await;
        });
    }
}

async fn serve_connection(stream: TcpStream, peer: SocketAddr, router: Router, timeouts: ServerTimeouts) {
    let _ = stream.set_nodelay(true);

    let activity = Arc::new(Activity::new());
    let io = TokioIo::new(TrackedStream::new(stream, Arc::clone(&activity)));
    let inner = TowerToHyperService::new(router);
    let tracked = Arc::clone(&activity);
    let svc = service_fn(move |req: Request<Incoming>| {
        tracked.request_started();
        let fut = inner.call(req);
        let tracked = Arc::clone(&tracked);
        async move {
            let res = fut.await;
            tracked.request_finished();
            res
        }
    });

    let mut builder = http1::Builder::new();
    builder.keep_alive(true);

    let connection = builder.serve_connection(io, svc);
    tokio::pin!(connection);

    tokio::select! {
        res = connection.as_mut() => {
            if let Err(e) = res {
                tracing::debug!(%peer, error = %e, "connection closed with error");
            }
            return;
        }
        expiry = conn::watchdog(&activity, &timeouts) => match expiry {
            Expiry::HeaderRead => {
                tracing::debug!(%peer, "header read timeout; dropping connection");
                return;
            }
            Expiry::WriteStalled => {
                tracing::debug!(%peer, "write stalled; dropping connection");
                return;
            }
            Expiry::Idle => {
                tracing::debug!(%peer, "idle timeout; closing connection");
                connection.as_mut().graceful_shutdown();
            }
        },
    }

    match tokio::time::timeout(timeouts.write, connection).await {
        Ok(Err(e)) => tracing::debug!(%peer, error = %e, "connection closed with error"),
        Err(_) => tracing::debug!(%peer, "graceful close timed out; dropping connection"),
        Ok(Ok(())) => {}
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_literal_and_port_only_addresses() {
        let sa = resolve_listen_address("127.0.0.1:8080").await.unwrap();
        assert_eq!(sa, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());

        let sa = resolve_listen_address(":9100").await.unwrap();
        assert_eq!(sa, "0.0.0.0:9100".parse::<SocketAddr>().unwrap());
    }

    #[tokio::test]
    async fn resolves_hostnames() {
        let sa = resolve_listen_address("localhost:0").await.unwrap();
        assert!(sa.ip().is_loopback());
        assert_eq!(sa.port(), 0);
    }

    #[tokio::test]
    async fn rejects_garbage_addresses() {
        let err = resolve_listen_address("not an address").await.unwrap_err();
        assert!(matches!(err, MetrixdError::InvalidAddress(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn transient_accept_errors() {
        assert!(accept_error_is_transient(&io::Error::from(io::ErrorKind::ConnectionAborted)));
        assert!(accept_error_is_transient(&io::Error::from_raw_os_error(24)));
        assert!(!accept_error_is_transient(&io::Error::from(io::ErrorKind::PermissionDenied)));
    }
}
