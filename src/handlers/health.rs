use crate::{ApiResponse, AppState};
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::time::Instant;

/// Tracks application start time for uptime calculation
static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize the start time (call this on application startup)
pub fn init_start_time() {
    let _ = START_TIME.get_or_init(Instant::now);
}

fn uptime_secs() -> u64 {
    START_TIME.get().map(|t| t.elapsed().as_secs()).unwrap_or(0)
}

/// Liveness plus a database ping; answers 200 even when the database is down.
async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let started = Instant::now();
    let database = match crate::db::check_connection(&state.db).await {
        Ok(()) => "connected",
        Err(_) => "disconnected",
    };
    Json(json!({
        "status": "healthy",
        "database": database,
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": uptime_secs(),
        "response_time_ms": started.elapsed().as_millis(),
    }))
}

/// Readiness check: 503 until the database answers.
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match crate::db::check_connection(&state.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ready", "checks": { "database": "up" } })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "checks": { "database": "down" },
                "error": e.to_string(),
            })),
        ),
    }
}

/// `GET /api/v1/status`
pub async fn api_status(State(state): State<AppState>) -> Json<ApiResponse<Value>> {
    Json(ApiResponse::success(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "git": option_env!("GIT_HASH").unwrap_or("unknown"),
        "environment": state.config.environment,
        "uptime_secs": uptime_secs(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}

/// Unauthenticated health checks mounted at the root.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check))
}
