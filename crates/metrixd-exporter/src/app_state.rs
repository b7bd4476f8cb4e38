//! Shared application state for the exporter.
//!
//! Built once during the registration phase and only read afterwards.

use std::sync::Arc;

use metrixd_core::error::Result;
use metrixd_core::{BuildInfo, EnvironmentClass};
use tokio::runtime::Handle;

use crate::obs::ExporterMetrics;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    build: BuildInfo,
    environment: EnvironmentClass,
    metrics: ExporterMetrics,
}

impl AppState {
    /// Register the metric set. Samples the current Tokio runtime when called
    /// from inside one.
    pub fn new(build: BuildInfo, environment: EnvironmentClass) -> Result<Self> {
        let metrics = ExporterMetrics::new(&build, environment, Handle::try_current().ok())?;
        Ok(Self {
            inner: Arc::new(AppStateInner {
                build,
                environment,
                metrics,
            }),
        })
    }

    pub fn build(&self) -> &BuildInfo {
        &self.inner.build
    }

    pub fn environment(&self) -> EnvironmentClass {
        self.inner.environment
    }

    pub fn metrics(&self) -> &ExporterMetrics {
        &self.inner.metrics
    }
}
