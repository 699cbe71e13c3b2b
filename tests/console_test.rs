use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use serde_json::{json, Value};
use tempfile::TempDir;

use json_query_console::config::{CliArgs, ConsoleConfig};
use json_query_console::server::build_router;
use json_query_console::settings::{load_settings, PersistentSettings};
use json_query_console::state::{ConsoleState, SharedState};

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn mock_backend() -> Router {
    Router::new()
        .route(
            "/health",
            get(|| async { Json(json!({"status": "ok", "message": "running", "time": "now"})) }),
        )
        .route(
            "/query",
            post(|Json(body): Json<Value>| async move {
                if body["query"] == "missing" {
                    return Json(json!({"success": false, "error": "key not found"}));
                }
                Json(json!({
                    "success": true,
                    "data": {
                        "found": true,
                        "value": "Madrid",
                        "performance": {
                            "library_type": "standard",
                            "parse_time": 500,
                            "query_time": 1500,
                            "total_time": 2_000_000
                        }
                    }
                }))
            }),
        )
        .route(
            "/query/optimized",
            post(|| async {
                Json(json!({
                    "success": true,
                    "data": {"found": true, "value": "Madrid", "performance": {"total_time": 900}},
                    "optimization_stats": {
                        "TotalQueries": 3,
                        "AverageOptimizationTime": 500,
                        "TotalOptimizationTime": 1_500_000_000
                    }
                }))
            }),
        )
        .route(
            "/query/compare",
            post(|| async {
                Json(json!({
                    "success": true,
                    "results": {
                        "standard": {"found": true, "value": 1, "performance": {"total_time": 10}},
                        "fastjson": {"found": true, "value": 1, "performance": {"total_time": 5}}
                    }
                }))
            }),
        )
}

struct Console {
    base: String,
    state: SharedState,
    http: reqwest::Client,
    _settings_dir: TempDir,
}

async fn start_console() -> Console {
    let backend = serve(mock_backend()).await;
    let settings_dir = TempDir::new().unwrap();
    let args = CliArgs::parse_from([
        "json-query-console",
        "--backend-url",
        backend.as_str(),
        "--settings-dir",
        settings_dir.path().to_str().unwrap(),
    ]);
    let config = ConsoleConfig::resolve(args, &PersistentSettings::default());
    let state = Arc::new(ConsoleState::new(config).unwrap());
    let base = serve(build_router(state.clone())).await;

    Console {
        base,
        state,
        http: reqwest::Client::new(),
        _settings_dir: settings_dir,
    }
}

impl Console {
    async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .http
            .post(format!("{}{}", self.base, path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn get(&self, path: &str) -> Value {
        self.http
            .get(format!("{}{}", self.base, path))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn test_query_is_formatted_and_recorded() {
    let console = start_console().await;

    let (status, body) = console
        .post("/api/query", json!({"json": "{}", "query": "user.address.city"}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["sequence"], 1);
    assert_eq!(body["current"], true);

    let result = &body["result"];
    assert_eq!(result["value"], "Madrid");
    assert_eq!(result["performance"]["parse_time"]["formatted"], "500ns");
    assert_eq!(result["performance"]["query_time"]["formatted"], "1.50μs");
    assert_eq!(result["performance"]["total_time"]["formatted"], "2.00ms");
    assert_eq!(result["performance"]["total_time"]["raw"], 2_000_000);

    let latest = console.get("/api/results").await;
    assert_eq!(latest["query"]["sequence"], 1);
    assert_eq!(latest["query"]["result"]["value"], "Madrid");
    assert!(latest["query"]["error"].is_null());
}

#[tokio::test]
async fn test_failed_query_keeps_previous_result() {
    let console = start_console().await;

    console
        .post("/api/query", json!({"json": "{}", "query": "user.address.city"}))
        .await;
    let (status, body) = console
        .post("/api/query", json!({"json": "{}", "query": "missing"}))
        .await;
    assert_eq!(status, 422);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "key not found");

    let latest = console.get("/api/results").await;
    assert_eq!(latest["query"]["sequence"], 2);
    assert_eq!(latest["query"]["error"], "key not found");
    assert_eq!(latest["query"]["result"]["value"], "Madrid");
}

#[tokio::test]
async fn test_empty_path_is_bad_request() {
    let console = start_console().await;
    let (status, body) = console
        .post("/api/query", json!({"json": "{}", "query": ""}))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_compare_lists_engines_with_labels() {
    let console = start_console().await;

    let (status, body) = console
        .post("/api/compare", json!({"json": "{}", "query": "a"}))
        .await;
    assert_eq!(status, 200);

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["engine"], "standard");
    assert_eq!(results[0]["label"], "Standard Library");
    assert_eq!(results[1]["label"], "valyala/fastjson");
    assert_eq!(results[1]["performance"]["total_time"]["formatted"], "5ns");
}

#[tokio::test]
async fn test_health_reports_stopped_poller() {
    let console = start_console().await;

    let body = console.get("/health").await;
    assert_eq!(body["status"], "stopped");
    assert_eq!(body["backend"]["reachable"], true);
    assert_eq!(body["backend"]["status"], "ok");
    assert_eq!(body["poller"]["running"], false);
    assert_eq!(body["poller"]["has_snapshot"], false);
}

#[tokio::test]
async fn test_optimized_query_stats_share_query_units() {
    let console = start_console().await;

    let (status, body) = console
        .post(
            "/api/query",
            json!({"json": "{}", "query": "user.address.city", "optimized": true}),
        )
        .await;
    assert_eq!(status, 200);

    let stats = &body["result"]["optimization_stats"];
    assert_eq!(stats["total_queries"], 3);
    assert_eq!(stats["average_optimization_time"]["formatted"], "500ns");
    assert_eq!(stats["total_optimization_time"]["formatted"], "1500.00ms");
    assert_eq!(stats["average_optimization_time"]["raw"], 500);
}

#[tokio::test]
async fn test_engines_and_settings() {
    let console = start_console().await;

    let engines = console.get("/api/engines").await;
    assert_eq!(engines["default_engine"], "standard");
    assert_eq!(engines["engines"].as_array().unwrap().len(), 3);

    let resp = console
        .http
        .put(format!("{}/api/settings", console.base))
        .json(&json!({"poll_interval_secs": 0}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    let resp = console
        .http
        .put(format!("{}/api/settings", console.base))
        .json(&json!({"default_engine": "fastjson", "poll_interval_secs": 10}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let saved = load_settings(&console.state.config.settings_path());
    assert_eq!(saved.default_engine.as_deref(), Some("fastjson"));
    assert_eq!(saved.poll_interval_secs, Some(10));
}
