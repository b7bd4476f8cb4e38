use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use metrixd_core::error::{MetrixdError, Result};

pub const DEFAULT_LISTEN_ADDRESS: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    pub version: u32,

    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub detection: DetectionSection,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            version: 1,
            listen_address: default_listen_address(),
            server: ServerSection::default(),
            detection: DetectionSection::default(),
        }
    }
}

impl ExporterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MetrixdError::Config(format!(
                "unsupported config version {} (expected 1)",
                self.version
            )));
        }
        if self.listen_address.trim().is_empty() {
            return Err(MetrixdError::Config("listen_address must not be empty".into()));
        }

        self.server.validate()?;
        self.detection.validate()?;

        Ok(())
    }
}

/// HTTP listener timeouts, all in milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_header_read_timeout_ms")]
    pub header_read_timeout_ms: u64,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            header_read_timeout_ms: default_header_read_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            write_timeout_ms: default_write_timeout_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if !(100..=60_000).contains(&self.header_read_timeout_ms) {
            return Err(MetrixdError::Config(
                "server.header_read_timeout_ms must be between 100 and 60000".into(),
            ));
        }
        if !(100..=300_000).contains(&self.request_timeout_ms) {
            return Err(MetrixdError::Config(
                "server.request_timeout_ms must be between 100 and 300000".into(),
            ));
        }
        if !(100..=300_000).contains(&self.write_timeout_ms) {
            return Err(MetrixdError::Config(
                "server.write_timeout_ms must be between 100 and 300000".into(),
            ));
        }
        if !(1_000..=3_600_000).contains(&self.idle_timeout_ms) {
            return Err(MetrixdError::Config(
                "server.idle_timeout_ms must be between 1000 and 3600000".into(),
            ));
        }
        if self.header_read_timeout_ms > self.request_timeout_ms {
            return Err(MetrixdError::Config(
                "server.header_read_timeout_ms must not exceed request_timeout_ms".into(),
            ));
        }
        if self.idle_timeout_ms < self.request_timeout_ms {
            return Err(MetrixdError::Config(
                "server.idle_timeout_ms must not be shorter than request_timeout_ms".into(),
            ));
        }
        Ok(())
    }

    pub fn timeouts(&self) -> ServerTimeouts {
        ServerTimeouts {
            header_read: Duration::from_millis(self.header_read_timeout_ms),
            request: Duration::from_millis(self.request_timeout_ms),
            write: Duration::from_millis(self.write_timeout_ms),
            idle: Duration::from_millis(self.idle_timeout_ms),
        }
    }
}

/// Resolved listener timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerTimeouts {
    pub header_read: Duration,
    pub request: Duration,
    pub write: Duration,
    pub idle: Duration,
}

/// Environment detection knobs.
///
/// `command` is the detection tool plus any leading arguments; the mode flag
/// (`--container` / `--vm`) is appended last. An empty command skips the tool.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetectionSection {
    #[serde(default = "default_command")]
    pub command: Vec<String>,

    #[serde(default = "default_detect_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_sentinel_file")]
    pub sentinel_file: PathBuf,

    #[serde(default = "default_runtime_marker_file")]
    pub runtime_marker_file: PathBuf,

    #[serde(default = "default_cgroup_file")]
    pub cgroup_file: PathBuf,

    #[serde(default = "default_cgroup_markers")]
    pub cgroup_markers: Vec<String>,
}

impl Default for DetectionSection {
    fn default() -> Self {
        Self {
            command: default_command(),
            timeout_ms: default_detect_timeout_ms(),
            sentinel_file: default_sentinel_file(),
            runtime_marker_file: default_runtime_marker_file(),
            cgroup_file: default_cgroup_file(),
            cgroup_markers: default_cgroup_markers(),
        }
    }
}

impl DetectionSection {
    pub fn validate(&self) -> Result<()> {
        if !(100..=10_000).contains(&self.timeout_ms) {
            return Err(MetrixdError::Config(
                "detection.timeout_ms must be between 100 and 10000".into(),
            ));
        }
        if self.command.first().is_some_and(|p| p.trim().is_empty()) {
            return Err(MetrixdError::Config(
                "detection.command program must not be blank".into(),
            ));
        }
        if self.cgroup_markers.is_empty() {
            return Err(MetrixdError::Config(
                "detection.cgroup_markers must not be empty".into(),
            ));
        }
        if self.cgroup_markers.iter().any(|m| m.trim().is_empty()) {
            return Err(MetrixdError::Config(
                "detection.cgroup_markers must not contain blank entries".into(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_listen_address() -> String {
    DEFAULT_LISTEN_ADDRESS.into()
}
fn default_header_read_timeout_ms() -> u64 {
    5_000
}
fn default_request_timeout_ms() -> u64 {
    10_000
}
fn default_write_timeout_ms() -> u64 {
    10_000
}
fn default_idle_timeout_ms() -> u64 {
    30_000
}
fn default_command() -> Vec<String> {
    vec!["systemd-detect-virt".into()]
}
fn default_detect_timeout_ms() -> u64 {
    2_000
}
fn default_sentinel_file() -> PathBuf {
    PathBuf::from("/.dockerenv")
}
fn default_runtime_marker_file() -> PathBuf {
    PathBuf::from("/run/systemd/container")
}
fn default_cgroup_file() -> PathBuf {
    PathBuf::from("/proc/1/cgroup")
}
fn default_cgroup_markers() -> Vec<String> {
    ["docker", "kubepods", "containerd", "libpod", "podman", "lxc"]
        .into_iter()
        .map(String::from)
        .collect()
}
