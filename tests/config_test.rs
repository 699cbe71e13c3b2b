use clap::Parser;
use json_query_console::config::*;
use json_query_console::settings::PersistentSettings;
use std::path::PathBuf;

fn parse(args: &[&str]) -> CliArgs {
    let mut argv = vec!["json-query-console"];
    argv.extend_from_slice(args);
    CliArgs::parse_from(argv)
}

#[test]
fn test_default_constants() {
    assert_eq!(DEFAULT_BACKEND_URL, "http://localhost:8080");
    assert_eq!(STATS_POLL_INTERVAL_SECS, 5);
    assert_eq!(DEFAULT_CONSOLE_PORT, 9880);
}

#[test]
fn test_defaults_without_flags_or_settings() {
    let config = ConsoleConfig::resolve(
        parse(&["--settings-dir", "/tmp/console"]),
        &PersistentSettings::default(),
    );

    assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
    assert_eq!(config.port, DEFAULT_CONSOLE_PORT);
    assert_eq!(config.poll_interval_secs, STATS_POLL_INTERVAL_SECS);
    assert_eq!(config.request_timeout_secs, Some(DEFAULT_REQUEST_TIMEOUT_SECS));
    assert_eq!(config.default_engine.as_str(), "standard");
    assert_eq!(config.engines.len(), 3);
    assert!(config.log_file.is_none());
}

#[test]
fn test_saved_settings_fill_missing_flags() {
    let saved = PersistentSettings {
        backend_url: Some("http://10.0.0.2:8080".to_string()),
        default_engine: Some("fastjson".to_string()),
        poll_interval_secs: Some(10),
    };
    let config = ConsoleConfig::resolve(parse(&[]), &saved);

    assert_eq!(config.backend_url, "http://10.0.0.2:8080");
    assert_eq!(config.default_engine.as_str(), "fastjson");
    assert_eq!(config.poll_interval_secs, 10);
}

#[test]
fn test_flags_override_saved_settings() {
    let saved = PersistentSettings {
        backend_url: Some("http://10.0.0.2:8080".to_string()),
        default_engine: Some("fastjson".to_string()),
        poll_interval_secs: Some(10),
    };
    let config = ConsoleConfig::resolve(
        parse(&[
            "--backend-url",
            "http://backend:9000",
            "-e",
            "json-iterator",
            "--poll-interval-secs",
            "2",
        ]),
        &saved,
    );

    assert_eq!(config.backend_url, "http://backend:9000");
    assert_eq!(config.default_engine.as_str(), "json-iterator");
    assert_eq!(config.poll_interval_secs, 2);
}

#[test]
fn test_zero_interval_and_timeout_fall_back() {
    let config = ConsoleConfig::resolve(
        parse(&["--poll-interval-secs", "0", "--request-timeout-secs", "0"]),
        &PersistentSettings::default(),
    );
    assert_eq!(config.poll_interval_secs, STATS_POLL_INTERVAL_SECS);
    assert!(config.request_timeout_secs.is_none());
}

#[test]
fn test_unknown_default_engine_is_offered() {
    let config = ConsoleConfig::resolve(
        parse(&["--default-engine", "simdjson"]),
        &PersistentSettings::default(),
    );
    let ids: Vec<&str> = config.engines.iter().map(|e| e.as_str()).collect();
    assert_eq!(ids, vec!["standard", "json-iterator", "fastjson", "simdjson"]);
}

#[test]
fn test_settings_path() {
    let config = ConsoleConfig::resolve(
        parse(&["--settings-dir", "/tmp/console"]),
        &PersistentSettings::default(),
    );
    assert_eq!(
        config.settings_path(),
        PathBuf::from("/tmp/console/console-settings.json")
    );
}
