//! HTTP server for dishad.

use crate::config::DishaConfig;
use crate::pipeline::Pipeline;
use crate::rate_limit::RateLimiter;
use crate::routes;
use anyhow::Result;
use axum::Router;
use disha_shared::stats::StatsEngine;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers.
pub struct AppState {
    pub pipeline: Pipeline,
    pub stats: Arc<StatsEngine>,
    pub rate_limiter: RateLimiter,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(pipeline: Pipeline, stats: Arc<StatsEngine>, config: &DishaConfig) -> Self {
        Self {
            pipeline,
            stats,
            rate_limiter: RateLimiter::new(
                Duration::from_secs(config.rate_limit.window_secs),
                config.rate_limit.max_requests,
            ),
            start_time: Instant::now(),
        }
    }
}

/// Assemble the router. Split out from `run` so tests can drive the
/// full stack without a TCP listener.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::ask_routes())
        .merge(routes::health_routes())
        .merge(routes::stats_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server.
pub async fn run(state: AppState, bind: &str) -> Result<()> {
    let app = app(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("  Listening on http://{}", bind);

    axum::serve(listener, app).await?;
    Ok(())
}
