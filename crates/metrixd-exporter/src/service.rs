//! Exporter service: registration phase, then serving phase.
//!
//! `new` builds the metric set; `start` binds the listener and serves until the
//! process dies. There is no reconfiguration or restart path.

use std::net::SocketAddr;

use tokio::net::TcpListener;

use metrixd_core::error::{MetrixdError, Result};
use metrixd_core::{BuildInfo, EnvironmentClass};

use crate::app_state::AppState;
use crate::config::{ExporterConfig, ServerTimeouts};
use crate::{router, transport};

pub struct ExporterService {
    state: AppState,
    timeouts: ServerTimeouts,
}

impl ExporterService {
    /// Registration phase. Must run after detection has produced `environment`.
    pub fn new(cfg: &ExporterConfig, build: BuildInfo, environment: EnvironmentClass) -> Result<Self> {
        Ok(Self {
            state: AppState::new(build, environment)?,
            timeouts: cfg.server.timeouts(),
        })
    }

    /// Bind `listen_address`, log the startup line, and serve.
    pub async fn start(self, listen_address: &str) -> Result<()> {
        let addr = transport::resolve_listen_address(listen_address).await?;
        let listener = bind(addr).await?;
        let listen = listener.local_addr().unwrap_or(addr);

        tracing::info!(
            version = %self.state.build().version,
            %listen,
            environment = %self.state.environment(),
            "metrixd started; metrics on / and /metrics"
        );

        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let app = router::build_router(self.state, self.timeouts.request);
        transport::serve(listener, app, self.timeouts).await
    }
}

async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr).await.map_err(|source| MetrixdError::Bind {
        addr: addr.to_string(),
        source,
    })
}
