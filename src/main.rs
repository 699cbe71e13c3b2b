mod backend;
mod config;
mod duration;
mod error;
mod model;
mod poller;
mod routes;
mod server;
mod settings;
mod state;
mod view;

use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use config::{CliArgs, ConsoleConfig};
use state::ConsoleState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // Initialize tracing. The guard must outlive the server so the file
    // writer flushes on exit.
    let _log_guard = init_tracing(&args);

    let settings_dir = args
        .settings_dir
        .clone()
        .unwrap_or_else(config::default_settings_dir);
    let saved = settings::load_settings(&settings_dir.join(config::SETTINGS_FILE_NAME));
    let config = ConsoleConfig::resolve(args, &saved);

    info!("Starting json-query-console v{}", env!("CARGO_PKG_VERSION"));
    info!("Backend: {}", config.backend_url);
    info!("Default engine: {}", config.default_engine);
    info!("Stats poll interval: {}s", config.poll_interval_secs);

    let port = config.port;
    let state = Arc::new(ConsoleState::new(config)?);

    state.stats.start();

    let router = server::build_router(state.clone());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Console listening on http://0.0.0.0:{}", port);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Console shutting down");
    state.stats.stop();

    Ok(())
}

fn init_tracing(args: &CliArgs) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "json_query_console=info,tower_http=info".into());
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());

    match args.log_file.as_ref() {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "json-query-console.log".to_string());

            let appender = tracing_appender::rolling::daily(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
