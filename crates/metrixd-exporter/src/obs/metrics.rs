//! The exporter's metric set.
//!
//! Two constant gauges (`host_environment_info`, `metrixd_build_info`) sit next
//! to the process and Tokio runtime collectors. The constant gauges are set to
//! 1 once and never touched again, so concurrent scrapes need no coordination.

use prometheus::{Encoder, Gauge, Opts, Registry, TextEncoder};
use tokio::runtime::Handle;

use metrixd_core::error::{MetrixdError, Result};
use metrixd_core::{BuildInfo, EnvironmentClass};

use super::runtime::TokioRuntimeCollector;

pub const HOST_ENVIRONMENT_INFO: &str = "host_environment_info";
/// Labels: `version`, `rustc_version`. Queries keyed on a `go_version` label
/// will not match.
pub const BUILD_INFO: &str = "metrixd_build_info";

fn registration(e: prometheus::Error) -> MetrixdError {
    MetrixdError::Metrics(e.to_string())
}

/// Gauge fixed at 1 whose information lives in its constant labels.
fn info_gauge(name: &str, help: &str, labels: &[(&str, &str)]) -> Result<Gauge> {
    let opts = labels
        .iter()
        .fold(Opts::new(name, help), |o, (k, v)| o.const_label(*k, *v));
    let g = Gauge::with_opts(opts).map_err(registration)?;
    g.set(1.0);
    Ok(g)
}

pub struct ExporterMetrics {
    registry: Registry,
}

impl ExporterMetrics {
    /// Register the full metric set.
    ///
    /// `runtime` is the Tokio runtime to sample; `None` skips runtime gauges.
    pub fn new(
        build: &BuildInfo,
        environment: EnvironmentClass,
        runtime: Option<Handle>,
    ) -> Result<Self> {
        let registry = Registry::new();

        #[cfg(target_os = "linux")]
        {
            let pc = prometheus::process_collector::ProcessCollector::for_self();
            registry.register(Box::new(pc)).map_err(registration)?;
        }

        if let Some(handle) = runtime {
            let rc = TokioRuntimeCollector::new(handle).map_err(registration)?;
            registry.register(Box::new(rc)).map_err(registration)?;
        }

        let host = info_gauge(
            HOST_ENVIRONMENT_INFO,
            "Host environment type (one-hot): type={vm|container|physical}.",
            &[("type", environment.as_str())],
        )?;
        registry.register(Box::new(host)).map_err(registration)?;

        let build_info = info_gauge(
            BUILD_INFO,
            "Build information for the metrixd exporter.",
            &[
                ("version", build.version.as_str()),
                ("rustc_version", build.runtime_version.as_str()),
            ],
        )?;
        registry.register(Box::new(build_info)).map_err(registration)?;

        Ok(Self { registry })
    }

    /// Render in Prometheus text exposition format.
    pub fn render(&self) -> Result<String> {
        let families = self.registry.gather();
        let mut buf = Vec::with_capacity(8 * 1024);
        TextEncoder::new()
            .encode(&families, &mut buf)
            .map_err(|e| MetrixdError::Metrics(format!("encode failed: {e}")))?;
        String::from_utf8(buf).map_err(|e| MetrixdError::Metrics(format!("non-utf8 output: {e}")))
    }
}
