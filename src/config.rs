use clap::Parser;
use std::path::PathBuf;

use crate::model::{default_engines, EngineId};
use crate::settings::PersistentSettings;

/// JSON Query Console drives the JSON query backend and tracks its
/// optimizer statistics.
#[derive(Parser, Debug, Clone)]
#[command(name = "json-query-console")]
pub struct CliArgs {
    /// Base URL of the query backend
    #[arg(short = 'b', long = "backend-url")]
    pub backend_url: Option<String>,

    /// Console HTTP port
    #[arg(long = "port", default_value_t = DEFAULT_CONSOLE_PORT)]
    pub port: u16,

    /// Seconds between optimizer stats fetches
    #[arg(long = "poll-interval-secs")]
    pub poll_interval_secs: Option<u64>,

    /// Backend request timeout; 0 leaves the transport default
    #[arg(long = "request-timeout-secs", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,

    /// Engine used when a query does not name one
    #[arg(short = 'e', long = "default-engine")]
    pub default_engine: Option<String>,

    /// Directory holding console-settings.json
    #[arg(long = "settings-dir")]
    pub settings_dir: Option<PathBuf>,

    /// Mirror logs to a daily-rolling file at this path
    #[arg(short = 'l', long = "log-file")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub backend_url: String,
    pub port: u16,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: Option<u64>,
    pub default_engine: EngineId,
    pub engines: Vec<EngineId>,
    pub settings_dir: PathBuf,
    pub log_file: Option<PathBuf>,
}

// Backend constants
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// Console constants
pub const DEFAULT_CONSOLE_PORT: u16 = 9880;
pub const SETTINGS_FILE_NAME: &str = "console-settings.json";
pub const SETTINGS_DIR_NAME: &str = "json-query-console";

// Stats poller constants
pub const STATS_POLL_INTERVAL_SECS: u64 = 5;
pub const STATS_STREAM_KEEPALIVE_SECS: u64 = 15;

impl ConsoleConfig {
    /// CLI flags win over saved settings, which win over built-in defaults.
    pub fn resolve(args: CliArgs, settings: &PersistentSettings) -> Self {
        let backend_url = args
            .backend_url
            .or_else(|| settings.backend_url.clone())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

        let poll_interval_secs = args
            .poll_interval_secs
            .or(settings.poll_interval_secs)
            .filter(|secs| *secs > 0)
            .unwrap_or(STATS_POLL_INTERVAL_SECS);

        let default_engine = args
            .default_engine
            .or_else(|| settings.default_engine.clone())
            .map(EngineId::new)
            .unwrap_or_default();

        let mut engines = default_engines();
        if !engines.contains(&default_engine) {
            engines.push(default_engine.clone());
        }

        ConsoleConfig {
            backend_url,
            port: args.port,
            poll_interval_secs,
            request_timeout_secs: Some(args.request_timeout_secs).filter(|secs| *secs > 0),
            default_engine,
            engines,
            settings_dir: args.settings_dir.unwrap_or_else(default_settings_dir),
            log_file: args.log_file,
        }
    }

    pub fn settings_path(&self) -> PathBuf {
        self.settings_dir.join(SETTINGS_FILE_NAME)
    }
}

/// `<config dir>/json-query-console`, or the working directory when the
/// platform has no config dir.
pub fn default_settings_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join(SETTINGS_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
}
