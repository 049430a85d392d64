//! API routes for dishad.
//!
//! The question endpoint is served at `/ask` and `/v1/ask`. Boundary
//! validation and rate limiting happen here, before the pipeline sees
//! the request; past that point there are no error responses, only
//! contracts.

use crate::pipeline::{AskRequest, MAX_QUERY_CHARS, MIN_QUERY_CHARS};
use crate::server::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use disha_shared::contract::AnswerContract;
use disha_shared::stats::StatsSnapshot;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::LazyLock;
use tracing::info;

type AppStateArc = Arc<AppState>;

/// Injection-shaped input rejected outright. These never have a
/// legitimate reading as a policy question.
static HARMFUL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // SQL statement shapes
        Regex::new(r"(?i)\b(?:drop|delete|insert|update|truncate)\s+(?:table|from|into)\b")
            .unwrap(),
        // Code execution shapes
        Regex::new(r"(?i)\b(?:exec|eval|system|subprocess)\s*\(").unwrap(),
        // Markup/script injection
        Regex::new(r"(?i)<script[^>]*>").unwrap(),
        Regex::new(r"(?i)javascript:").unwrap(),
    ]
});

// ============================================================================
// Ask Routes
// ============================================================================

pub fn ask_routes() -> Router<AppStateArc> {
    // Served both bare and under the /v1 prefix.
    Router::new()
        .route("/ask", post(ask))
        .route("/v1/ask", post(ask))
}

async fn ask(
    State(state): State<AppStateArc>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AnswerContract>, (StatusCode, String)> {
    let text = req.text.trim();
    if text.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "text must not be empty".to_string()));
    }
    if text.chars().count() < MIN_QUERY_CHARS {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("text must be at least {} characters", MIN_QUERY_CHARS),
        ));
    }
    if req.text.chars().count() > MAX_QUERY_CHARS {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("text exceeds {} characters", MAX_QUERY_CHARS),
        ));
    }
    if HARMFUL_PATTERNS.iter().any(|p| p.is_match(&req.text)) {
        info!("Rejected query with disallowed content");
        return Err((
            StatusCode::BAD_REQUEST,
            "text contains disallowed content".to_string(),
        ));
    }

    let key = req.session_id().unwrap_or("anonymous");
    if !state.rate_limiter.check(key) {
        state.stats.record_rejected();
        info!(session = key, "Rate limit exceeded");
        return Err((
            StatusCode::TOO_MANY_REQUESTS,
            "rate limit exceeded, try again later".to_string(),
        ));
    }

    let contract = state.pipeline.handle(&req).await;
    Ok(Json(contract))
}

// ============================================================================
// Health Routes
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

pub fn health_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/health", get(health_check))
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

// ============================================================================
// Stats Routes
// ============================================================================

pub fn stats_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/stats", get(stats))
        .route("/v1/stats", get(stats))
}

async fn stats(State(state): State<AppStateArc>) -> Json<StatsSnapshot> {
    Json(state.stats.snapshot())
}
