//! Host classification and build identity.

use std::fmt;
use std::str::FromStr;

use crate::error::MetrixdError;

/// What kind of host the exporter runs on.
///
/// Computed once at startup and passed by value afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvironmentClass {
    Container,
    Vm,
    Physical,
}

impl EnvironmentClass {
    /// Label value used in `host_environment_info{type=...}`.
    pub fn as_str(self) -> &'static str {
        match self {
            EnvironmentClass::Container => "container",
            EnvironmentClass::Vm => "vm",
            EnvironmentClass::Physical => "physical",
        }
    }

    pub const ALL: [EnvironmentClass; 3] = [
        EnvironmentClass::Container,
        EnvironmentClass::Vm,
        EnvironmentClass::Physical,
    ];
}

impl fmt::Display for EnvironmentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvironmentClass {
    type Err = MetrixdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "container" => Ok(EnvironmentClass::Container),
            "vm" => Ok(EnvironmentClass::Vm),
            "physical" => Ok(EnvironmentClass::Physical),
            other => Err(MetrixdError::Config(format!(
                "unknown environment class: {other}"
            ))),
        }
    }
}

/// Build identity exported as `metrixd_build_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: String,
    pub runtime_version: String,
}

impl BuildInfo {
    pub const DEFAULT_VERSION: &'static str = "dev";

    pub fn new(version: impl Into<String>, runtime_version: impl Into<String>) -> Self {
        let version = version.into();
        let runtime_version = runtime_version.into();
        Self {
            version: if version.trim().is_empty() {
                Self::DEFAULT_VERSION.to_string()
            } else {
                version
            },
            runtime_version: if runtime_version.trim().is_empty() {
                "unknown".to_string()
            } else {
                runtime_version
            },
        }
    }
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self::new(Self::DEFAULT_VERSION, "unknown")
    }
}
