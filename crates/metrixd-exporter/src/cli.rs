//! Command-line surface.
//!
//! Long flags are accepted with one dash too (`-listen-address`), matching
//! the flag style operators already use for Prometheus exporters.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

use crate::build_info;

#[derive(Debug, Parser)]
#[command(name = "metrixd", version = build_info::VERSION, about = "Minimal Prometheus exporter for host environment and build info")]
pub struct Cli {
    /// HTTP listen address (host:port). Overrides the config file.
    #[arg(long = "listen-address", value_name = "HOST:PORT")]
    pub listen_address: Option<String>,

    /// Optional YAML config file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

const LONG_FLAGS: [&str; 4] = ["listen-address", "config", "help", "version"];

/// Rewrite `-flag` / `-flag=value` to `--flag` / `--flag=value` for known
/// long flags. Everything after a bare `--` is left alone.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut out = Vec::new();
    let mut passthrough = false;
    for (i, arg) in args.into_iter().enumerate() {
        if i == 0 || passthrough {
            out.push(arg);
            continue;
        }
        let Some(s) = arg.to_str() else {
            out.push(arg);
            continue;
        };
        if s == "--" {
            passthrough = true;
            out.push(arg);
            continue;
        }
        let rewritten = s
            .strip_prefix('-')
            .filter(|rest| !rest.starts_with('-'))
            .filter(|rest| {
                let name = rest.split_once('=').map_or(*rest, |(n, _)| n);
                LONG_FLAGS.contains(&name)
            })
            .map(|rest| OsString::from(format!("--{rest}")));
        out.push(rewritten.unwrap_or(arg));
    }
    out
}

/// One-line usage banner printed to stderr at startup.
pub fn banner() -> String {
    format!(
        "metrixd {} - Prometheus exporter; flags: -listen-address, -config",
        build_info::VERSION
    )
}

impl Cli {
    pub fn parse_normalized() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }
}
