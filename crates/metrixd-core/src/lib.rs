//! metrixd core: the data model and error surface shared by the exporter.
//!
//! This crate holds the host classification, build identity, and the error
//! type. It carries no runtime or transport dependencies so detection logic and
//! tests can use it without pulling in the HTTP stack.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod host;

/// Shared result type.
pub use error::{MetrixdError, Result};
pub use host::{BuildInfo, EnvironmentClass};
