//! Build identity baked in at compile time.
//!
//! `METRIXD_VERSION` is read from the build environment (default `dev`); the
//! rustc version is captured by `build.rs`.

use metrixd_core::BuildInfo;

pub const VERSION: &str = match option_env!("METRIXD_VERSION") {
    Some(v) => v,
    None => BuildInfo::DEFAULT_VERSION,
};

pub const RUSTC_VERSION: &str = env!("METRIXD_RUSTC_VERSION");

pub fn current() -> BuildInfo {
    BuildInfo::new(VERSION, RUSTC_VERSION)
}
