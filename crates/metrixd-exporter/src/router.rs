//! Axum router wiring.
//!
//! The metrics payload is served at both `/` and `/metrics`; every other path
//! gets axum's default 404.

use std::time::Duration;

use axum::{routing::get, Router};
use tower_http::timeout::TimeoutLayer;

use crate::{app_state::AppState, ops};

pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/", get(ops::metrics))
        .route("/metrics", get(ops::metrics))
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}
