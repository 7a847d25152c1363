//! Configuration for the pdetect tool
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/parkinson-detect/config.toml)
//! 3. Built-in defaults (lowest priority)

use serde::Deserialize;

// ─────────────────────────────────────────────────────────────────────────────
// Submodules
// ─────────────────────────────────────────────────────────────────────────────

mod api;
mod dashboard;
mod observability;
mod serialization;
mod storage;

#[cfg(test)]
mod tests;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (maintain public API)
// ─────────────────────────────────────────────────────────────────────────────

pub use api::{ApiConfig, FileApiConfig};
pub use dashboard::{DashboardConfig, FileDashboardConfig};
pub use observability::{FileLogging, LogRotation, LoggingConfig};
pub use storage::{
    FileSecurityConfig, FileSessionConfig, FileStorageConfig, SecurityConfig, SessionConfig,
    StorageConfig,
};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Directory name used under ~/.config and the platform data directory
pub const APP_DIR: &str = "parkinson-detect";

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Application configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Prediction endpoint settings
    pub api: ApiConfig,

    /// Where the JSON documents live
    pub storage: StorageConfig,

    /// Session lifetimes
    pub session: SessionConfig,

    /// Password hashing parameters
    pub security: SecurityConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Terminal dashboard settings
    pub dashboard: DashboardConfig,
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Config file structure (subset of Config that makes sense to persist)
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    /// Optional [api] section
    pub api: Option<FileApiConfig>,

    /// Optional [storage] section
    pub storage: Option<FileStorageConfig>,

    /// Optional [session] section
    pub session: Option<FileSessionConfig>,

    /// Optional [security] section
    pub security: Option<FileSecurityConfig>,

    /// Optional [logging] section
    pub logging: Option<FileLogging>,

    /// Optional [dashboard] section
    pub dashboard: Option<FileDashboardConfig>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

/// Boolean-ish env value ("1", "true", "yes")
fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes")
}

impl Config {
    /// Get the config file path: ~/.config/parkinson-detect/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<std::path::PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join(APP_DIR).join("config.toml"))
    }

    /// Create config file with defaults if it doesn't exist
    /// Called during startup to help users discover configuration options
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };

        // Don't overwrite existing config
        if path.exists() {
            return;
        }

        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // Silently fail - config is optional
            }
        }

        // Use Config::default().to_toml() as single source of truth
        let _ = std::fs::write(&path, Self::default().to_toml());
    }

    /// Load file config if it exists
    ///
    /// Exits the process if the config file exists but cannot be read or parsed
    fn load_file_config() -> FileConfig {
        let Some(path) = Self::config_path() else {
            return FileConfig::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => match Self::parse_file_config(&contents) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("\n╔══════════════════════════════════════════════════════════════╗");
                    eprintln!("║  CONFIG ERROR - Failed to parse configuration file          ║");
                    eprintln!("╚══════════════════════════════════════════════════════════════╝\n");
                    eprintln!("  File: {}\n", path.display());
                    eprintln!("  Error: {}\n", e);
                    eprintln!("  Tip: Check for:\n");
                    eprintln!("    - Missing quotes around string values");
                    eprintln!("    - Invalid boolean values (use true/false)");
                    eprintln!("    - Typos in section names\n");
                    eprintln!("  To reset, run `pdetect config --reset`.\n");
                    std::process::exit(1);
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FileConfig::default(),
            Err(e) => {
                eprintln!("\n╔══════════════════════════════════════════════════════════════╗");
                eprintln!("║  CONFIG ERROR - Cannot read configuration file              ║");
                eprintln!("╚══════════════════════════════════════════════════════════════╝\n");
                eprintln!("  File: {}\n", path.display());
                eprintln!("  Error: {}\n", e);
                std::process::exit(1);
            }
        }
    }

    pub(crate) fn parse_file_config(contents: &str) -> Result<FileConfig, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Load configuration: file -> env vars -> defaults
    pub fn from_env() -> Self {
        let mut config = Self::from_config_file();
        config.apply_env(|name| std::env::var(name).ok());
        config
    }

    /// The config file resolved against defaults, without env overrides
    ///
    /// Rewriting the file starts from this so env-only values are never
    /// persisted.
    pub fn from_config_file() -> Self {
        Self::from_file(Self::load_file_config())
    }

    /// Resolve a parsed config file against defaults
    pub(crate) fn from_file(file: FileConfig) -> Self {
        Self {
            api: ApiConfig::from_file(file.api),
            storage: StorageConfig::from_file(file.storage),
            session: SessionConfig::from_file(file.session),
            security: SecurityConfig::from_file(file.security),
            logging: LoggingConfig::from_file(file.logging),
            dashboard: DashboardConfig::from_file(file.dashboard),
        }
    }

    /// Apply `PDETECT_*` overrides read through `var`
    pub(crate) fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("PDETECT_API_URL") {
            self.api.base_url = url;
        }
        if let Some(token) = var("PDETECT_API_TOKEN").filter(|t| !t.trim().is_empty()) {
            self.api.token = Some(token);
        }
        if let Some(demo) = var("PDETECT_DEMO_FALLBACK") {
            self.api.demo_fallback = is_truthy(&demo);
        }
        if let Some(dir) = var("PDETECT_DATA_DIR") {
            self.storage.data_dir = dir.into();
        }
    }

    /// Save current configuration to file
    pub fn save(&self) -> Result<(), std::io::Error> {
        let Some(path) = Self::config_path() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config path",
            ));
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&path, self.to_toml())
    }
}
