use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(crate::routes::health::health))
        // Queries
        .route("/api/query", post(crate::routes::query::run_query))
        .route("/api/compare", post(crate::routes::query::run_compare))
        .route("/api/results", get(crate::routes::query::latest_results))
        // Optimizer stats
        .route("/api/stats", get(crate::routes::stats::stats))
        .route("/api/stats/stream", get(crate::routes::stats::stats_stream))
        .route("/api/stats/refresh", post(crate::routes::stats::refresh_stats))
        .route("/api/stats/warm", post(crate::routes::stats::warm_stats))
        // Engines and settings
        .route("/api/engines", get(crate::routes::settings::engines))
        .route("/api/settings", put(crate::routes::settings::update_settings))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
