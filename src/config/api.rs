//! Prediction endpoint configuration
//!
//! The bearer token has no default. It is read
//! from `PDETECT_API_TOKEN` or the `[api] token` key.

use serde::Deserialize;

/// Default public endpoint of the motion-analysis model
pub const DEFAULT_API_URL: &str = "https://parkinsonapi.ewr.appspot.com";

/// Prediction endpoint settings
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the prediction service
    pub base_url: String,
    /// Path appended to base_url for submissions
    pub predict_path: String,
    /// Bearer token sent with each submission (None = no Authorization header)
    pub token: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Substitute a labelled demo prediction when the request fails
    pub demo_fallback: bool,
    /// Simulated latency before the demo prediction is returned
    pub demo_delay_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            predict_path: "/predict".to_string(),
            token: None,
            timeout_secs: 60,
            demo_fallback: false,
            demo_delay_ms: 1500,
        }
    }
}

/// API settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileApiConfig {
    pub base_url: Option<String>,
    pub predict_path: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: Option<u64>,
    pub demo_fallback: Option<bool>,
    pub demo_delay_ms: Option<u64>,
}

impl ApiConfig {
    /// Create from file config with defaults
    pub fn from_file(file: Option<FileApiConfig>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            base_url: file.base_url.unwrap_or(defaults.base_url),
            predict_path: file.predict_path.unwrap_or(defaults.predict_path),
            token: file.token.filter(|t| !t.trim().is_empty()),
            timeout_secs: file.timeout_secs.unwrap_or(defaults.timeout_secs),
            demo_fallback: file.demo_fallback.unwrap_or(defaults.demo_fallback),
            demo_delay_ms: file.demo_delay_ms.unwrap_or(defaults.demo_delay_ms),
        }
    }

    /// Full submission URL (base_url + predict_path, single slash)
    pub fn predict_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = self.predict_path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}
