//! Exporter config loader (strict parsing).
//!
//! The config file is optional; without one every field takes its default.

pub mod schema;

use std::fs;
use std::path::Path;

use metrixd_core::error::{MetrixdError, Result};

pub use schema::{DetectionSection, ExporterConfig, ServerSection, ServerTimeouts};

pub fn load_from_file(path: impl AsRef<Path>) -> Result<ExporterConfig> {
    let path = path.as_ref();
    let s = fs::read_to_string(path)
        .map_err(|e| MetrixdError::Config(format!("read {} failed: {e}", path.display())))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ExporterConfig> {
    let cfg: ExporterConfig = serde_yaml::from_str(s)
        .map_err(|e| MetrixdError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Resolve the effective config: file (if any), then the CLI listen override.
pub fn resolve(path: Option<&Path>, listen_override: Option<&str>) -> Result<ExporterConfig> {
    let mut cfg = match path {
        Some(p) => load_from_file(p)?,
        None => ExporterConfig::default(),
    };
    if let Some(addr) = listen_override {
        cfg.listen_address = addr.to_string();
        cfg.validate()?;
    }
    Ok(cfg)
}
