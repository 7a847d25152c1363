//! Configuration tests
//!
//! These tests guard the TOML format: every field written by `to_toml()`
//! must parse back through the `File*` structs and land in the same place.

use super::*;
use crate::stats::Period;
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Round-trip tests
// ─────────────────────────────────────────────────────────────────────────────

/// Verify that serialized config can be parsed back.
#[test]
fn test_config_roundtrip_default() {
    let config = Config::default();
    let toml_str = config.to_toml();

    let parsed = Config::parse_file_config(&toml_str);
    assert!(
        parsed.is_ok(),
        "Default config should round-trip.\nTOML:\n{}\nError: {:?}",
        toml_str,
        parsed.err()
    );
}

/// Non-default values survive serialization and reloading.
#[test]
fn test_config_roundtrip_custom_values() {
    let mut config = Config::default();
    config.api.predict_path = "/v2/predict".to_string();
    config.api.timeout_secs = 5;
    config.api.demo_fallback = true;
    config.api.demo_delay_ms = 0;
    config.storage.data_dir = PathBuf::from("/tmp/pdetect-data");
    config.storage.seed_dir = Some(PathBuf::from("/tmp/pdetect-seed"));
    config.session.ephemeral_hours = 6;
    config.security.pbkdf2_iterations = 1_000;
    config.logging.level = "debug".to_string();
    config.logging.file_rotation = LogRotation::Hourly;
    config.dashboard.default_period = Period::Month;
    config.dashboard.tick_ms = 500;

    let file = Config::parse_file_config(&config.to_toml()).expect("custom config should parse");

    let api = ApiConfig::from_file(file.api);
    assert_eq!(api.predict_path, "/v2/predict");
    assert_eq!(api.timeout_secs, 5);
    assert!(api.demo_fallback);
    assert_eq!(api.demo_delay_ms, 0);

    let storage = StorageConfig::from_file(file.storage);
    assert_eq!(storage.data_dir, PathBuf::from("/tmp/pdetect-data"));
    assert_eq!(storage.seed_dir, Some(PathBuf::from("/tmp/pdetect-seed")));

    assert_eq!(SessionConfig::from_file(file.session).ephemeral_hours, 6);
    assert_eq!(
        SecurityConfig::from_file(file.security).pbkdf2_iterations,
        1_000
    );

    let logging = LoggingConfig::from_file(file.logging);
    assert_eq!(logging.level, "debug");
    assert_eq!(logging.file_rotation, LogRotation::Hourly);

    let dashboard = DashboardConfig::from_file(file.dashboard);
    assert_eq!(dashboard.default_period, Period::Month);
    assert_eq!(dashboard.tick_ms, 500);
}

/// Rewriting the file keeps a token that lives in it.
#[test]
fn test_file_token_survives_rewrite() {
    let file = Config::parse_file_config("[api]\ntoken = \"secret-token\"\n").unwrap();
    let rewritten = Config::from_file(file).to_toml();

    let reparsed = Config::parse_file_config(&rewritten).expect("rewritten config should parse");
    let config = Config::from_file(reparsed);
    assert_eq!(config.api.token.as_deref(), Some("secret-token"));
}

/// Env overrides apply on load but never reach the rewritten file.
#[test]
fn test_env_overrides_not_persisted() {
    let file = Config::parse_file_config("[storage]\ndata_dir = \"/srv/pdetect\"\n").unwrap();
    let file_only = Config::from_file(file);

    let mut effective = file_only.clone();
    effective.apply_env(|name| match name {
        "PDETECT_API_TOKEN" => Some("env-token".to_string()),
        "PDETECT_DATA_DIR" => Some("/tmp/elsewhere".to_string()),
        "PDETECT_DEMO_FALLBACK" => Some("yes".to_string()),
        _ => None,
    });
    assert_eq!(effective.api.token.as_deref(), Some("env-token"));
    assert_eq!(effective.storage.data_dir, PathBuf::from("/tmp/elsewhere"));
    assert!(effective.api.demo_fallback);

    let toml_str = file_only.to_toml();
    assert!(!toml_str.contains("env-token"));
    assert!(!toml_str.contains("/tmp/elsewhere"));
    assert!(toml_str.contains("/srv/pdetect"));
}

#[test]
fn test_blank_env_token_is_ignored() {
    let mut config = Config::default();
    config.apply_env(|name| (name == "PDETECT_API_TOKEN").then(|| "  ".to_string()));
    assert!(config.api.token.is_none());
}

/// Windows paths must be escaped, or the generated file fails to parse.
#[test]
fn test_backslash_paths_roundtrip() {
    let mut config = Config::default();
    config.storage.data_dir = PathBuf::from(r"C:\Users\jean\AppData\Roaming\parkinson-detect");
    config.storage.seed_dir = Some(PathBuf::from(r"D:\seed"));
    config.logging.file_dir = PathBuf::from(r"C:\Users\jean\logs");
    config.api.token = Some(r#"quo"te\back"#.to_string());

    let file = Config::parse_file_config(&config.to_toml()).expect("escaped config should parse");
    let parsed = Config::from_file(file);
    assert_eq!(parsed.storage.data_dir, config.storage.data_dir);
    assert_eq!(parsed.storage.seed_dir, config.storage.seed_dir);
    assert_eq!(parsed.logging.file_dir, config.logging.file_dir);
    assert_eq!(parsed.api.token, config.api.token);
}

// ─────────────────────────────────────────────────────────────────────────────
// Defaults and sanitising
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_empty_file_uses_defaults() {
    let file = Config::parse_file_config("").unwrap();
    let api = ApiConfig::from_file(file.api);
    let defaults = ApiConfig::default();

    assert_eq!(api.predict_path, defaults.predict_path);
    assert!(!api.demo_fallback, "demo fallback must be opt-in");
    assert!(api.token.is_none());
}

#[test]
fn test_blank_token_is_ignored() {
    let file = Config::parse_file_config("[api]\ntoken = \"   \"\n").unwrap();
    assert!(ApiConfig::from_file(file.api).token.is_none());
}

#[test]
fn test_invalid_values_fall_back() {
    let file = Config::parse_file_config(
        r#"
[session]
ephemeral_hours = -3

[security]
pbkdf2_iterations = 0

[dashboard]
default_period = "fortnight"
tick_ms = 0

[logging]
file_rotation = "weekly"
"#,
    )
    .unwrap();

    assert_eq!(SessionConfig::from_file(file.session).ephemeral_hours, 24);
    assert_eq!(SecurityConfig::from_file(file.security).pbkdf2_iterations, 1);
    let dashboard = DashboardConfig::from_file(file.dashboard);
    assert_eq!(dashboard.default_period, Period::All);
    assert_eq!(dashboard.tick_ms, 250);
    assert_eq!(
        LoggingConfig::from_file(file.logging).file_rotation,
        LogRotation::Daily
    );
}

#[test]
fn test_logging_level_is_checked() {
    let file = Config::parse_file_config("[logging]\nlevel = \" Debug \"\nfile_prefix = \"\"\n").unwrap();
    let logging = LoggingConfig::from_file(file.logging);
    assert_eq!(logging.level, "debug");
    assert_eq!(logging.filter_directive(), "warn,pdetect=debug");
    assert_eq!(logging.file_prefix, "pdetect");

    let file = Config::parse_file_config("[logging]\nlevel = \"loud\"\n").unwrap();
    assert_eq!(LoggingConfig::from_file(file.logging).level, "warn");
}

#[test]
fn test_malformed_file_is_an_error() {
    assert!(Config::parse_file_config("[api\nbase_url = 1").is_err());
}

#[test]
fn test_predict_url_joins_single_slash() {
    let mut api = ApiConfig::default();
    api.base_url = "http://localhost:8000/".to_string();
    api.predict_path = "/predict".to_string();
    assert_eq!(api.predict_url(), "http://localhost:8000/predict");

    api.base_url = "http://localhost:8000".to_string();
    api.predict_path = "predict".to_string();
    assert_eq!(api.predict_url(), "http://localhost:8000/predict");
}
