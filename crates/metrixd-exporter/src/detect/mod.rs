//! Host environment detection.
//!
//! Order (first match wins):
//! 1. detection tool `--container`
//! 2. detection tool `--vm`
//! 3. sentinel file, runtime marker file, cgroup markers
//! 4. `physical`
//!
//! Detection is total: every failure along the way just moves on to the next
//! strategy.

pub mod heuristics;
pub mod probe;

use std::path::PathBuf;
use std::time::Duration;

use metrixd_core::EnvironmentClass;

use crate::config::DetectionSection;

/// Which strategy produced the classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionSource {
    Tool,
    SentinelFile,
    RuntimeMarker,
    Cgroup,
    Fallback,
}

impl DetectionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            DetectionSource::Tool => "tool",
            DetectionSource::SentinelFile => "sentinel_file",
            DetectionSource::RuntimeMarker => "runtime_marker",
            DetectionSource::Cgroup => "cgroup",
            DetectionSource::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub class: EnvironmentClass,
    pub source: DetectionSource,
}

impl Detection {
    fn new(class: EnvironmentClass, source: DetectionSource) -> Self {
        Self { class, source }
    }
}

#[derive(Debug, Clone)]
pub struct EnvironmentDetector {
    command: Vec<String>,
    timeout: Duration,
    sentinel_file: PathBuf,
    runtime_marker_file: PathBuf,
    cgroup_file: PathBuf,
    cgroup_markers: Vec<String>,
}

impl EnvironmentDetector {
    pub fn new(cfg: &DetectionSection) -> Self {
        Self {
            command: cfg.command.clone(),
            timeout: cfg.timeout(),
            sentinel_file: cfg.sentinel_file.clone(),
            runtime_marker_file: cfg.runtime_marker_file.clone(),
            cgroup_file: cfg.cgroup_file.clone(),
            cgroup_markers: cfg.cgroup_markers.clone(),
        }
    }

    /// Classify the host.
    pub async fn detect(&self) -> EnvironmentClass {
        self.detect_with_source().await.class
    }

    /// Classify the host and report which strategy decided.
    pub async fn detect_with_source(&self) -> Detection {
        if probe::confirms(&self.command, "--container", self.timeout).await {
            return Detection::new(EnvironmentClass::Container, DetectionSource::Tool);
        }
        if probe::confirms(&self.command, "--vm", self.timeout).await {
            return Detection::new(EnvironmentClass::Vm, DetectionSource::Tool);
        }

        if heuristics::sentinel_present(&self.sentinel_file) {
            tracing::debug!(path = %self.sentinel_file.display(), "container sentinel file present");
            return Detection::new(EnvironmentClass::Container, DetectionSource::SentinelFile);
        }
        if heuristics::runtime_marker_present(&self.runtime_marker_file) {
            tracing::debug!(path = %self.runtime_marker_file.display(), "container runtime marker present");
            return Detection::new(EnvironmentClass::Container, DetectionSource::RuntimeMarker);
        }
        if let Some(marker) = heuristics::cgroup_marker(&self.cgroup_file, &self.cgroup_markers) {
            tracing::debug!(path = %self.cgroup_file.display(), marker, "container cgroup marker matched");
            return Detection::new(EnvironmentClass::Container, DetectionSource::Cgroup);
        }

        Detection::new(EnvironmentClass::Physical, DetectionSource::Fallback)
    }
}
