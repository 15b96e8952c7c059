use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// RSS ceiling the memory check measures against.
const MEMORY_LIMIT_BYTES: u64 = 1_400_000_000;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/info", get(info))
        .route("/live", get(live))
        .route("/ready", get(ready))
}

async fn root(State(state): State<AppState>) -> Response {
    let db_status = database_check(&state).await;
    let ok = matches!(db_status, DbCheckStatus::Connected { .. });

    let response = CompatHealthResponse {
        database: if ok { "connected" } else { "disconnected" },
        timestamp: now_iso(),
        status: if ok { "ok" } else { "degraded" },
    };

    let status_code = if ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(response)).into_response()
}

async fn info(State(state): State<AppState>) -> Response {
    let response = HealthInfoResponse {
        service: "satprep-backend",
        version: app_version(),
        start_time: system_time_iso(state.started_at_system()),
        uptime: state.uptime_seconds(),
    };

    Json(response).into_response()
}

async fn live(State(state): State<AppState>) -> Response {
    let process_healthy = std::process::id() > 0;
    let memory_healthy = check_memory_health(0.9);

    let status = if process_healthy && memory_healthy {
        "healthy"
    } else {
        "unhealthy"
    };

    let response = LivenessResponse {
        status,
        timestamp: now_iso(),
        uptime: state.uptime_seconds(),
        version: app_version(),
        checks: LivenessChecks {
            process: process_healthy,
            memory: memory_healthy,
        },
    };

    let status_code = if status == "healthy" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response)).into_response()
}

async fn ready(State(state): State<AppState>) -> Response {
    let db_check = database_check(&state).await;
    let memory_healthy = check_memory_health(0.9);

    let (database_status, database_latency_ms) = match db_check {
        DbCheckStatus::Connected { latency_ms } => ("connected", latency_ms),
        DbCheckStatus::Timeout => ("timeout", None),
        DbCheckStatus::Disconnected => ("disconnected", None),
    };

    let status = if database_status == "disconnected" {
        "unhealthy"
    } else if database_status == "timeout" || !memory_healthy {
        "degraded"
    } else {
        "healthy"
    };

    let response = ReadinessResponse {
        status,
        timestamp: now_iso(),
        uptime: state.uptime_seconds(),
        version: app_version(),
        checks: ReadinessChecks {
            database: database_status,
            memory: memory_healthy,
        },
        details: ReadinessDetails {
            database_latency_ms,
            memory_usage: read_rss_bytes(),
            memory_limit: MEMORY_LIMIT_BYTES,
        },
    };

    let status_code = match status {
        "healthy" | "degraded" => StatusCode::OK,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response)).into_response()
}

#[derive(Debug)]
enum DbCheckStatus {
    Connected { latency_ms: Option<u64> },
    Timeout,
    Disconnected,
}

async fn database_check(state: &AppState) -> DbCheckStatus {
    let Some(proxy) = state.db_proxy() else {
        return DbCheckStatus::Disconnected;
    };

    let primary = proxy.primary_status().await;
    if primary.healthy {
        return DbCheckStatus::Connected {
            latency_ms: primary.latency_ms,
        };
    }
    if primary.error.as_deref() == Some("timeout") {
        return DbCheckStatus::Timeout;
    }
    DbCheckStatus::Disconnected
}

fn app_version() -> String {
    std::env::var("APP_VERSION")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string())
}

fn system_time_iso(time: std::time::SystemTime) -> String {
    let datetime: chrono::DateTime<chrono::Utc> = time.into();
    datetime.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn check_memory_health(threshold: f64) -> bool {
    let rss = read_rss_bytes();
    if rss == 0 {
        return true;
    }
    (rss as f64) / (MEMORY_LIMIT_BYTES as f64) < threshold
}

fn read_rss_bytes() -> u64 {
    read_proc_self_status_kb("VmRSS").unwrap_or(0) * 1024
}

fn read_proc_self_status_kb(prefix: &str) -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    for line in status.lines() {
        let trimmed = line.trim_start();
        if !trimmed.starts_with(prefix) {
            continue;
        }
        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        if parts.len() < 2 {
            continue;
        }
        let value: u64 = parts[1].parse().ok()?;
        return Some(value);
    }
    None
}

#[derive(Serialize)]
struct CompatHealthResponse {
    database: &'static str,
    timestamp: String,
    status: &'static str,
}

#[derive(Serialize)]
struct HealthInfoResponse {
    service: &'static str,
    version: String,
    start_time: String,
    uptime: u64,
}

#[derive(Serialize)]
struct LivenessResponse {
    status: &'static str,
    timestamp: String,
    uptime: u64,
    version: String,
    checks: LivenessChecks,
}

#[derive(Serialize)]
struct LivenessChecks {
    process: bool,
    memory: bool,
}

#[derive(Serialize)]
struct ReadinessResponse {
    status: &'static str,
    timestamp: String,
    uptime: u64,
    version: String,
    checks: ReadinessChecks,
    details: ReadinessDetails,
}

#[derive(Serialize)]
struct ReadinessChecks {
    database: &'static str,
    memory: bool,
}

#[derive(Serialize)]
struct ReadinessDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    database_latency_ms: Option<u64>,
    memory_usage: u64,
    memory_limit: u64,
}
