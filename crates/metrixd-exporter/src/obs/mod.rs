//! Metric registry and collectors.
//!
//! Everything is registered on a private `prometheus::Registry` owned by the
//! app state; the process-wide default registry is never touched.

pub mod metrics;
pub mod runtime;

pub use metrics::ExporterMetrics;
