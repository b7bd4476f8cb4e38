//! HTTP transport: accept loop and per-connection timeouts.

pub mod conn;
pub mod server;

pub use server::{resolve_listen_address, serve};
