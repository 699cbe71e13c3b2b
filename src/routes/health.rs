use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::poller::PollPhase;
use crate::state::SharedState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub backend: BackendStatus,
    pub poller: PollerHealth,
    pub console: ConsoleInfo,
}

#[derive(Serialize)]
pub struct BackendStatus {
    pub url: String,
    pub reachable: bool,
    pub status: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct PollerHealth {
    pub running: bool,
    pub phase: PollPhase,
    pub interval_secs: u64,
    pub fetch_count: u64,
    /// A snapshot is held, even if the latest fetch failed.
    pub has_snapshot: bool,
    pub last_error: Option<String>,
}

#[derive(Serialize)]
pub struct ConsoleInfo {
    pub version: String,
    pub port: u16,
    pub default_engine: String,
    pub started_at: String,
}

/// Overall status from backend reachability and the poller phase.
/// Pure so it can be tested without a backend.
pub fn determine_overall_status(backend_reachable: bool, phase: PollPhase) -> &'static str {
    match phase {
        PollPhase::Idle => "stopped",
        PollPhase::Error => "degraded",
        _ if backend_reachable => "healthy",
        _ => "degraded",
    }
}

pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(build_health_response(&state).await)
}

pub async fn build_health_response(state: &SharedState) -> HealthResponse {
    let probe = state.backend.health().await;
    let status = state.stats.status();

    let backend = match probe {
        Ok(h) => BackendStatus {
            url: state.backend.base_url().to_string(),
            reachable: true,
            status: Some(h.status),
            message: Some(h.message),
            error: None,
        },
        Err(e) => BackendStatus {
            url: state.backend.base_url().to_string(),
            reachable: false,
            status: None,
            message: None,
            error: Some(e.to_string()),
        },
    };

    HealthResponse {
        status: determine_overall_status(backend.reachable, status.phase).to_string(),
        backend,
        poller: PollerHealth {
            running: state.stats.is_running(),
            phase: status.phase,
            interval_secs: state.stats.interval().as_secs(),
            fetch_count: status.fetch_count,
            has_snapshot: state.stats.snapshot().is_some(),
            last_error: status.last_error,
        },
        console: ConsoleInfo {
            version: env!("CARGO_PKG_VERSION").to_string(),
            port: state.config.port,
            default_engine: state.config.default_engine.to_string(),
            started_at: state.started_at.to_rfc3339(),
        },
    }
}
