//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use std::path::Path;

use super::Config;

/// TOML basic string with escapes (Windows paths carry backslashes)
fn quoted(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}

fn quoted_path(path: &Path) -> String {
    quoted(&path.display().to_string())
}

impl Config {
    /// Optional seed directory line (commented out when unset)
    fn seed_dir_to_toml(&self) -> String {
        match &self.storage.seed_dir {
            Some(dir) => format!("seed_dir = {}", quoted_path(dir)),
            None => "# seed_dir = \"./seed\"   # users.json / analyses.json copied in on first run"
                .to_string(),
        }
    }

    /// Token line: kept when set, a commented hint otherwise
    fn token_to_toml(&self) -> String {
        match &self.api.token {
            Some(token) => format!("token = {}", quoted(token)),
            None => "# token = \"...\"   # Prefer the PDETECT_API_TOKEN env var".to_string(),
        }
    }

    /// Serialize config to TOML string
    ///
    /// Writes `api.token` when set. Build the config with
    /// `Config::from_config_file` before saving so a token from
    /// PDETECT_API_TOKEN never reaches the file.
    pub fn to_toml(&self) -> String {
        format!(
            r#"# pdetect configuration

# Prediction endpoint
[api]
base_url = {base_url}
predict_path = {predict_path}
timeout_secs = {timeout}
# Substitute a labelled demo result when the endpoint cannot be reached
demo_fallback = {demo_fallback}
demo_delay_ms = {demo_delay}
{token}

# Local document store
[storage]
data_dir = {data_dir}
{seed_dir}

# Session without "remember me" (hours)
[session]
ephemeral_hours = {ephemeral_hours}

# Password hashing (PBKDF2-HMAC-SHA256)
[security]
pbkdf2_iterations = {iterations}

# Logging configuration (RUST_LOG env var overrides)
[logging]
level = {log_level}
file_enabled = {file_enabled}
file_dir = {file_dir}
file_rotation = "{file_rotation}"
file_prefix = {file_prefix}

# Terminal dashboard
[dashboard]
default_period = "{period}"   # 7d, 30d, all
tick_ms = {tick_ms}
"#,
            base_url = quoted(&self.api.base_url),
            predict_path = quoted(&self.api.predict_path),
            timeout = self.api.timeout_secs,
            demo_fallback = self.api.demo_fallback,
            demo_delay = self.api.demo_delay_ms,
            token = self.token_to_toml(),
            data_dir = quoted_path(&self.storage.data_dir),
            seed_dir = self.seed_dir_to_toml(),
            ephemeral_hours = self.session.ephemeral_hours,
            iterations = self.security.pbkdf2_iterations,
            log_level = quoted(&self.logging.level),
            file_enabled = self.logging.file_enabled,
            file_dir = quoted_path(&self.logging.file_dir),
            file_rotation = self.logging.file_rotation.as_str(),
            file_prefix = quoted(&self.logging.file_prefix),
            period = self.dashboard.default_period.as_str(),
            tick_ms = self.dashboard.tick_ms,
        )
    }
}
