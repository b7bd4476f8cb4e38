//! Shared error type across metrixd crates.

use std::io;

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, MetrixdError>;

/// Unified error type used by core and exporter.
///
/// Only startup failures are modeled here. Detection problems never surface as
/// errors; they degrade to a fallback classification instead.
#[derive(Debug, Error)]
pub enum MetrixdError {
    #[error("config: {0}")]
    Config(String),
    #[error("invalid listen address: {0}")]
    InvalidAddress(String),
    #[error("bind {addr} failed: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("http server failed: {0}")]
    Serve(#[source] io::Error),
    #[error("metrics registration failed: {0}")]
    Metrics(String),
}

impl MetrixdError {
    /// Process exit code for a fatal error.
    ///
    /// `2` for operator mistakes (bad config or address), `1` for everything
    /// that went wrong at runtime.
    pub fn exit_code(&self) -> u8 {
        match self {
            MetrixdError::Config(_) | MetrixdError::InvalidAddress(_) => 2,
            MetrixdError::Bind { .. } | MetrixdError::Serve(_) | MetrixdError::Metrics(_) => 1,
        }
    }
}
