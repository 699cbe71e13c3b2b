use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::backend::compare::ComparisonClient;
use crate::backend::query::QueryClient;
use crate::error::ConsoleError;
use crate::model::{EngineId, QueryMode, QueryRequest};
use crate::state::{ResultSlot, SharedState};
use crate::view::{ComparisonView, QueryView};

#[derive(Deserialize)]
pub struct QueryPayload {
    pub json: String,
    pub query: String,
    #[serde(default)]
    pub library: Option<String>,
    #[serde(default)]
    pub optimized: bool,
}

impl QueryPayload {
    fn mode(&self) -> QueryMode {
        if self.optimized {
            QueryMode::Optimized
        } else {
            QueryMode::Standard
        }
    }
}

/// POST /api/query: run one query against one engine.
pub async fn run_query(
    State(state): State<SharedState>,
    Json(body): Json<QueryPayload>,
) -> Result<impl IntoResponse, ConsoleError> {
    let sequence = state.next_submission();
    let mode = body.mode();
    let engine = body
        .library
        .filter(|l| !l.trim().is_empty())
        .map(EngineId::new)
        .unwrap_or_else(|| state.config.default_engine.clone());

    let mut request = QueryRequest::new(body.json, body.query, engine);
    request.mode = mode;

    let result = QueryClient::new(&state.backend)
        .query(&request)
        .await
        .map(Arc::new);
    let current = record(&state.last_query, sequence, &result).await;
    let report = result?;

    Ok(Json(json!({
        "success": true,
        "sequence": sequence,
        "current": current,
        "result": QueryView::from(report.as_ref()),
    })))
}

/// POST /api/compare: run the query on every engine the backend has.
pub async fn run_compare(
    State(state): State<SharedState>,
    Json(body): Json<QueryPayload>,
) -> Result<impl IntoResponse, ConsoleError> {
    let sequence = state.next_submission();

    let result = ComparisonClient::new(&state.backend)
        .compare(&body.json, &body.query, body.mode())
        .await
        .map(Arc::new);
    let current = record(&state.last_comparison, sequence, &result).await;
    let comparison = result?;

    let view = ComparisonView::from(comparison.as_ref());
    Ok(Json(json!({
        "success": true,
        "sequence": sequence,
        "current": current,
        "results": view.results,
        "optimization_stats": view.optimization_stats,
    })))
}

/// GET /api/results: latest query and comparison, with their last errors.
pub async fn latest_results(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let query = state.last_query.read().await;
    let comparison = state.last_comparison.read().await;

    Json(json!({
        "query": {
            "sequence": query.applied_sequence(),
            "result": query.value().map(|r| QueryView::from(r.as_ref())),
            "error": query.error(),
            "updated_at": query.updated_at(),
        },
        "comparison": {
            "sequence": comparison.applied_sequence(),
            "results": comparison.value().map(|c| ComparisonView::from(c.as_ref())),
            "error": comparison.error(),
            "updated_at": comparison.updated_at(),
        },
    }))
}

/// Stores a resolution in its slot. Returns whether it became the current one.
async fn record<T>(
    slot: &tokio::sync::RwLock<ResultSlot<T>>,
    sequence: u64,
    result: &Result<Arc<T>, ConsoleError>,
) -> bool {
    let entry = match result {
        Ok(value) => Ok(Arc::clone(value)),
        Err(e) => Err(e.to_string()),
    };
    slot.write().await.apply(sequence, entry)
}
