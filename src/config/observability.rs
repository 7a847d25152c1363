//! `[logging]` section
//!
//! `level` only applies to this crate's targets (`warn,pdetect=<level>`);
//! RUST_LOG replaces the whole directive. File output is JSON lines, off
//! unless `file_enabled` is set.

use serde::Deserialize;
use std::path::PathBuf;

use super::storage::default_data_dir;

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const DEFAULT_LEVEL: &str = "warn";

/// When tracing-appender starts a new log file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogRotation {
    Hourly,
    #[default]
    Daily,
    Never,
}

impl LogRotation {
    /// Unknown names fall back to daily
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "hourly" => Self::Hourly,
            "never" => Self::Never,
            _ => Self::Daily,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Never => "never",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error
    pub level: String,
    pub file_enabled: bool,
    pub file_dir: PathBuf,
    pub file_rotation: LogRotation,
    /// File name stem, e.g. "pdetect" -> "pdetect.2026-10-18"
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL.to_string(),
            file_enabled: false,
            file_dir: default_data_dir().join("logs"),
            file_rotation: LogRotation::Daily,
            file_prefix: "pdetect".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileLogging {
    pub level: Option<String>,
    pub file_enabled: Option<bool>,
    pub file_dir: Option<String>,
    pub file_rotation: Option<String>,
    pub file_prefix: Option<String>,
}

impl LoggingConfig {
    pub fn from_file(file: Option<FileLogging>) -> Self {
        let FileLogging {
            level,
            file_enabled,
            file_dir,
            file_rotation,
            file_prefix,
        } = file.unwrap_or_default();
        let defaults = Self::default();

        let level = level
            .map(|l| l.trim().to_ascii_lowercase())
            .filter(|l| LEVELS.contains(&l.as_str()))
            .unwrap_or(defaults.level);

        Self {
            level,
            file_enabled: file_enabled.unwrap_or(defaults.file_enabled),
            file_dir: file_dir.map(PathBuf::from).unwrap_or(defaults.file_dir),
            file_rotation: file_rotation
                .as_deref()
                .map(LogRotation::from_name)
                .unwrap_or(defaults.file_rotation),
            file_prefix: file_prefix
                .filter(|p| !p.trim().is_empty())
                .unwrap_or(defaults.file_prefix),
        }
    }

    /// EnvFilter directive used when RUST_LOG is unset
    pub fn filter_directive(&self) -> String {
        format!("{},pdetect={}", DEFAULT_LEVEL, self.level)
    }
}
