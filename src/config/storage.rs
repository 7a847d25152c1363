//! Storage, session and password-hashing configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::APP_DIR;

// ─────────────────────────────────────────────────────────────────────────────
// Storage Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Location of the JSON document store
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding users.json, analyses.json and the persistent session
    pub data_dir: PathBuf,
    /// Optional directory of seed documents copied in on first load
    pub seed_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            seed_dir: None,
        }
    }
}

/// Platform data directory, or ./data when none can be determined
pub(super) fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("./data"))
}

/// Storage settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileStorageConfig {
    pub data_dir: Option<String>,
    pub seed_dir: Option<String>,
}

impl StorageConfig {
    /// Create from file config with defaults
    pub fn from_file(file: Option<FileStorageConfig>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            data_dir: file.data_dir.map(PathBuf::from).unwrap_or(defaults.data_dir),
            seed_dir: file.seed_dir.map(PathBuf::from).or(defaults.seed_dir),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Session lifetimes
///
/// The remember-me lifetime comes from the users document
/// (`config.sessionExpiryDays`), so only the ephemeral scope is set here.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Lifetime of a session created without "remember me"
    pub ephemeral_hours: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { ephemeral_hours: 24 }
    }
}

/// Session settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileSessionConfig {
    pub ephemeral_hours: Option<i64>,
}

impl SessionConfig {
    /// Create from file config with defaults
    pub fn from_file(file: Option<FileSessionConfig>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            ephemeral_hours: file
                .ephemeral_hours
                .filter(|h| *h > 0)
                .unwrap_or(defaults.ephemeral_hours),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Security Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Password hashing parameters for new hashes
///
/// Existing hashes carry their own iteration count, so raising this value
/// never locks anyone out.
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub pbkdf2_iterations: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            pbkdf2_iterations: crate::auth::password::DEFAULT_ITERATIONS,
        }
    }
}

/// Security settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileSecurityConfig {
    pub pbkdf2_iterations: Option<u32>,
}

impl SecurityConfig {
    /// Create from file config with defaults
    pub fn from_file(file: Option<FileSecurityConfig>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            pbkdf2_iterations: file
                .pbkdf2_iterations
                .map(|n| n.max(1))
                .unwrap_or(defaults.pbkdf2_iterations),
        }
    }
}
