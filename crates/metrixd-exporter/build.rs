//! Build script for metrixd-exporter.
//!
//! Captures the compiler version for `metrixd_build_info`.

use std::process::Command;

fn rustc_version() -> Option<String> {
    let rustc = std::env::var("RUSTC").unwrap_or_else(|_| "rustc".into());
    let out = Command::new(rustc).arg("--version").output().ok()?;
    if !out.status.success() {
        return None;
    }
    // "rustc 1.80.0 (051478957 2024-07-21)"
    String::from_utf8_lossy(&out.stdout)
        .split_whitespace()
        .nth(1)
        .map(str::to_string)
}

fn main() {
    let version = rustc_version().unwrap_or_else(|| "unknown".into());
    println!("cargo:rustc-env=METRIXD_RUSTC_VERSION={version}");
    println!("cargo:rerun-if-env-changed=METRIXD_VERSION");
    println!("cargo:rerun-if-changed=build.rs");
}
