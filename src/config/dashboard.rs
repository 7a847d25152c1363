//! Terminal dashboard configuration

use serde::Deserialize;

use crate::stats::Period;

/// Dashboard settings
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Period selected when the dashboard opens
    pub default_period: Period,
    /// Redraw interval in milliseconds
    pub tick_ms: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_period: Period::All,
            tick_ms: 250,
        }
    }
}

/// Dashboard settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileDashboardConfig {
    pub default_period: Option<String>,
    pub tick_ms: Option<u64>,
}

impl DashboardConfig {
    /// Create from file config with defaults
    pub fn from_file(file: Option<FileDashboardConfig>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            default_period: file
                .default_period
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.default_period),
            tick_ms: file.tick_ms.filter(|t| *t > 0).unwrap_or(defaults.tick_ms),
        }
    }
}
