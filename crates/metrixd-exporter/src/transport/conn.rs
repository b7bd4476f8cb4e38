//! Connection activity tracking.
//!
//! All per-connection deadlines except the request timeout are enforced here by
//! watching I/O progress on the socket:
//! - header read: from connection start, or from the first byte of a new
//!   request on a kept-alive connection, until hyper hands the request to the
//!   service
//! - idle: no I/O while no request is in flight or being read
//! - stalled write: a write that keeps returning `Pending`

use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::config::ServerTimeouts;

const UNSET: u64 = u64::MAX;

/// Last-progress bookkeeping shared between a stream, its service, and its
/// watchdog.
///
/// Timestamps are milliseconds since `origin`.
#[derive(Debug)]
pub struct Activity {
    origin: Instant,
    last_io_ms: AtomicU64,
    write_stalled_since_ms: AtomicU64,
    headers_since_ms: AtomicU64,
    in_request: AtomicBool,
}

impl Activity {
    /// A fresh connection is waiting for its first request's headers.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            last_io_ms: AtomicU64::new(0),
            write_stalled_since_ms: AtomicU64::new(UNSET),
            headers_since_ms: AtomicU64::new(0),
            in_request: AtomicBool::new(false),
        }
    }

    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn since(&self, ms: u64) -> Duration {
        Duration::from_millis(self.now_ms().saturating_sub(ms))
    }

    fn read_progressed(&self) {
        let now = self.now_ms();
        self.last_io_ms.store(now, Ordering::Relaxed);
        if !self.in_request.load(Ordering::Relaxed) {
            let _ = self.headers_since_ms.compare_exchange(
                UNSET,
                now,
                Ordering::Relaxed,
                Ordering::Relaxed,
            );
        }
    }

    fn write_pending(&self) {
        let now = self.now_ms();
        let _ = self.write_stalled_since_ms.compare_exchange(
            UNSET,
            now,
            Ordering::Relaxed,
            Ordering::Relaxed,
        );
    }

    fn write_progressed(&self, touched: bool) {
        self.write_stalled_since_ms.store(UNSET, Ordering::Relaxed);
        if touched {
            self.last_io_ms.store(self.now_ms(), Ordering::Relaxed);
        }
    }

    /// Headers are complete and the request reached the service.
    pub fn request_started(&self) {
        self.in_request.store(true, Ordering::Relaxed);
        self.headers_since_ms.store(UNSET, Ordering::Relaxed);
    }

    /// The service produced its response.
    pub fn request_finished(&self) {
        self.last_io_ms.store(self.now_ms(), Ordering::Relaxed);
        self.in_request.store(false, Ordering::Relaxed);
    }

    /// Time since the last byte moved in either direction.
    pub fn idle_for(&self) -> Duration {
        self.since(self.last_io_ms.load(Ordering::Relaxed))
    }

    /// How long the current request's headers have been arriving, if they are.
    pub fn awaiting_headers_for(&self) -> Option<Duration> {
        match self.headers_since_ms.load(Ordering::Relaxed) {
            UNSET => None,
            since => Some(self.since(since)),
        }
    }

    /// How long the current write has been blocked, if one is.
    pub fn write_stalled_for(&self) -> Option<Duration> {
        match self.write_stalled_since_ms.load(Ordering::Relaxed) {
            UNSET => None,
            since => Some(self.since(since)),
        }
    }

    /// Kept alive with nothing in flight.
    fn between_requests(&self) -> bool {
        !self.in_request.load(Ordering::Relaxed)
            && self.headers_since_ms.load(Ordering::Relaxed) == UNSET
    }
}

impl Default for Activity {
    fn default() -> Self {
        Self::new()
    }
}

/// Why the watchdog gave up on a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    HeaderRead,
    Idle,
    WriteStalled,
}

/// Resolve once a deadline in `timeouts` (other than the request timeout)
/// has passed.
pub async fn watchdog(activity: &Activity, timeouts: &ServerTimeouts) -> Expiry {
    let tick = (timeouts.header_read.min(timeouts.idle).min(timeouts.write) / 4)
        .max(Duration::from_millis(50));
    loop {
        tokio::time::sleep(tick).await;
        if activity
            .write_stalled_for()
            .is_some_and(|d| d >= timeouts.write)
        {
            return Expiry::WriteStalled;
        }
        if activity
            .awaiting_headers_for()
            .is_some_and(|d| d >= timeouts.header_read)
        {
            return Expiry::HeaderRead;
        }
        if activity.between_requests() && activity.idle_for() >= timeouts.idle {
            return Expiry::Idle;
        }
    }
}

/// Stream wrapper that reports progress to an [`Activity`].
pub struct TrackedStream<S> {
    inner: S,
    activity: Arc<Activity>,
}

impl<S> TrackedStream<S> {
    pub fn new(inner: S, activity: Arc<Activity>) -> Self {
        Self { inner, activity }
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for TrackedStream<S> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        let res = Pin::new(&mut self.inner).poll_read(cx, buf);
        if matches!(res, Poll::Ready(Ok(()))) && buf.filled().len() > before {
            self.activity.read_progressed();
        }
        res
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for TrackedStream<S> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let res = Pin::new(&mut self.inner).poll_write(cx, buf);
        match &res {
            Poll::Ready(Ok(n)) => self.activity.write_progressed(*n > 0),
            Poll::Ready(Err(_)) => self.activity.write_progressed(false),
            Poll::Pending => self.activity.write_pending(),
        }
        res
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}
