//! metrixd: minimal Prometheus exporter.
//!
//! Startup order:
//! - usage banner on stderr
//! - logging
//! - config (file + CLI override)
//! - environment detection
//! - metric registration
//! - bind + serve on `/` and `/metrics`

use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use metrixd_core::error::Result;
use metrixd_exporter::cli::{self, Cli};
use metrixd_exporter::{build_info, config, EnvironmentDetector, ExporterService};

#[tokio::main]
async fn main() -> ExitCode {
    eprintln!("{}", cli::banner());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let args = Cli::parse_normalized();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "metrixd failed");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let cfg = config::resolve(cli.config.as_deref(), cli.listen_address.as_deref())?;

    let detection = EnvironmentDetector::new(&cfg.detection).detect_with_source().await;
    tracing::debug!(
        environment = %detection.class,
        source = detection.source.as_str(),
        "host environment detected"
    );

    let service = ExporterService::new(&cfg, build_info::current(), detection.class)?;
    service.start(&cfg.listen_address).await
}
