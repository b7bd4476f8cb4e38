//! metrixd exporter library entry.
//!
//! Wires config, environment detection, the metric registry, and the HTTP
//! transport into the exporter service. Consumed by the `metrixd` binary and
//! by integration tests.

pub mod app_state;
pub mod build_info;
pub mod cli;
pub mod config;
pub mod detect;
pub mod obs;
pub mod ops;
pub mod router;
pub mod service;
pub mod transport;

pub use detect::{Detection, DetectionSource, EnvironmentDetector};
pub use service::ExporterService;
