use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/live", get(live))
        .route("/info", get(info))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
    latency_ms: Option<u64>,
    consecutive_failures: u32,
    timestamp: String,
}

/// Reports the background monitor's latest database check rather than probing
/// inline; the monitor keeps the snapshot fresh on its own interval.
async fn root(State(state): State<AppState>) -> Response {
    let snapshot = match state.db() {
        Some(db) => Some(db.health_status().await),
        None => None,
    };
    let connected = snapshot.as_ref().map(|s| s.healthy).unwrap_or(false);

    let response = HealthResponse {
        status: if connected { "ok" } else { "degraded" },
        database: if connected {
            "connected"
        } else {
            "disconnected"
        },
        latency_ms: snapshot.as_ref().and_then(|s| s.latency_ms),
        consecutive_failures: snapshot.map(|s| s.consecutive_failures).unwrap_or(0),
        timestamp: now_iso(),
    };

    let status_code = if connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(response)).into_response()
}

#[derive(Serialize)]
struct LivenessResponse {
    status: &'static str,
    timestamp: String,
    uptime: u64,
}

async fn live(State(state): State<AppState>) -> Response {
    Json(LivenessResponse {
        status: "healthy",
        timestamp: now_iso(),
        uptime: state.uptime_seconds(),
    })
    .into_response()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthInfoResponse {
    service: &'static str,
    version: String,
    environment: String,
    start_time: String,
    uptime: u64,
}

async fn info(State(state): State<AppState>) -> Response {
    Json(HealthInfoResponse {
        service: "blinkvocab-backend",
        version: std::env::var("APP_VERSION")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
        environment: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        start_time: system_time_iso(state.started_at_system()),
        uptime: state.uptime_seconds(),
    })
    .into_response()
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn system_time_iso(time: SystemTime) -> String {
    let since_epoch = time.duration_since(UNIX_EPOCH).unwrap_or_default();
    DateTime::<Utc>::from_timestamp(since_epoch.as_secs() as i64, since_epoch.subsec_nanos())
        .unwrap_or_else(Utc::now)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
