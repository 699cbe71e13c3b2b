use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;

use crate::config::STATS_STREAM_KEEPALIVE_SECS;
use crate::error::ConsoleError;
use crate::state::SharedState;
use crate::view::PollerView;

/// GET /api/stats: latest poller state and snapshot.
pub async fn stats(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let status = state.stats.status();
    Json(json!({
        "running": state.stats.is_running(),
        "interval_secs": state.stats.interval().as_secs(),
        "poller": PollerView::from(&status),
    }))
}

/// GET /api/stats/stream: SSE, one `stats` event per poller state change.
pub async fn stats_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = WatchStream::new(state.stats.subscribe()).map(|status| {
        let data = serde_json::to_string(&PollerView::from(&status)).unwrap_or_default();
        Ok(Event::default().event("stats").data(data))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new().interval(Duration::from_secs(STATS_STREAM_KEEPALIVE_SECS)),
    )
}

/// POST /api/stats/refresh: fetch now instead of waiting for the timer.
pub async fn refresh_stats(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let status = if state.stats.refresh() {
        "refresh_requested"
    } else {
        "poller_not_running"
    };
    Json(json!({ "status": status }))
}

#[derive(Deserialize)]
pub struct WarmRequest {
    pub json: String,
    pub query: String,
}

/// POST /api/stats/warm: run one optimized query server-side, then refresh.
pub async fn warm_stats(
    State(state): State<SharedState>,
    Json(body): Json<WarmRequest>,
) -> Result<impl IntoResponse, ConsoleError> {
    let message = state.backend.update_stats(&body.json, &body.query).await?;
    state.stats.refresh();

    Ok(Json(json!({
        "success": true,
        "message": message,
    })))
}
