use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tracing::info;

use crate::error::ConsoleError;
use crate::settings::{save_settings, PersistentSettings};
use crate::state::SharedState;

/// GET /api/engines: engines the presenter should offer.
pub async fn engines(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let engines: Vec<_> = state
        .config
        .engines
        .iter()
        .map(|e| json!({ "id": e.as_str(), "label": e.label() }))
        .collect();

    Json(json!({
        "default_engine": state.config.default_engine.as_str(),
        "engines": engines,
    }))
}

/// PUT /api/settings: persist preferences for the next launch.
pub async fn update_settings(
    State(state): State<SharedState>,
    Json(body): Json<PersistentSettings>,
) -> Result<impl IntoResponse, ConsoleError> {
    if body.poll_interval_secs == Some(0) {
        return Err(ConsoleError::InvalidRequest(
            "poll_interval_secs must be positive".to_string(),
        ));
    }
    if let Some(url) = body.backend_url.as_deref() {
        url::Url::parse(url)
            .map_err(|e| ConsoleError::InvalidRequest(format!("backend_url: {}", e)))?;
    }

    let path = state.config.settings_path();
    save_settings(&path, &body)?;
    info!("Saved console settings to {:?}", path);

    Ok(Json(json!({
        "success": true,
        "settings": body,
        "applies": "next_launch",
    })))
}
