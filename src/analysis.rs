//! Analysis outcomes: classification of a prediction and conversion into a
//! stored analysis record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::VERSION;
use crate::predict::{Prediction, Upload, API_VERSION};
use crate::store::NewAnalysis;

/// Reference decision threshold used by charts when no analysis supplies one
pub const REFERENCE_THRESHOLD: f64 = 1.376;

/// Health-risk class derived from the model label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    #[serde(rename = "healthy")]
    Healthy,
    #[serde(rename = "at-risk")]
    AtRisk,
}

impl Classification {
    /// "Sain" and "Healthy" are the model's healthy labels; anything else is a risk.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if label.eq_ignore_ascii_case("sain") || label.eq_ignore_ascii_case("healthy") {
            Self::Healthy
        } else {
            Self::AtRisk
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::AtRisk => "at-risk",
        }
    }

    /// Headline shown with a result
    pub fn headline(&self) -> &'static str {
        match self {
            Self::Healthy => "Healthy Motion Patterns",
            Self::AtRisk => "Abnormal Patterns Detected",
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a prediction came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionSource {
    /// Returned by the prediction endpoint
    #[default]
    Live,
    /// Substituted locally because the endpoint failed and demo fallback is on
    Demo,
}

/// Result of one submission, ready to display or save
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub prediction: Prediction,
    pub classification: Classification,
    pub source: PredictionSource,
    /// Why a demo prediction was used (None for live results)
    pub fallback_cause: Option<String>,
    pub file_name: String,
    pub file_size: u64,
    pub file_sha256: String,
    pub elapsed_ms: u64,
    pub completed_at: DateTime<Utc>,
}

impl AnalysisOutcome {
    pub fn live(prediction: Prediction, upload: &Upload, elapsed_ms: u64) -> Self {
        Self::build(prediction, upload, elapsed_ms, PredictionSource::Live, None)
    }

    pub fn demo(prediction: Prediction, upload: &Upload, elapsed_ms: u64, cause: String) -> Self {
        Self::build(
            prediction,
            upload,
            elapsed_ms,
            PredictionSource::Demo,
            Some(cause),
        )
    }

    fn build(
        prediction: Prediction,
        upload: &Upload,
        elapsed_ms: u64,
        source: PredictionSource,
        fallback_cause: Option<String>,
    ) -> Self {
        Self {
            classification: Classification::from_label(&prediction.label),
            prediction,
            source,
            fallback_cause,
            file_name: upload.file_name.clone(),
            file_size: upload.size,
            file_sha256: upload.sha256.clone(),
            elapsed_ms,
            completed_at: Utc::now(),
        }
    }

    pub fn is_demo(&self) -> bool {
        self.source == PredictionSource::Demo
    }

    /// Record to hand to `DataStore::save_analysis`
    pub fn to_new_analysis(&self) -> NewAnalysis {
        NewAnalysis {
            file_name: self.file_name.clone(),
            score: self.prediction.score,
            label: self.prediction.label.clone(),
            windows: self.prediction.windows,
            threshold: self.prediction.threshold,
            result: self.classification,
            analysis_time: self.elapsed_ms,
            file_size: self.file_size,
            file_sha256: Some(self.file_sha256.clone()),
            source: self.source,
        }
    }
}

/// Client identifier stored with each analysis
pub fn client_id() -> String {
    format!("pdetect/{}", VERSION)
}

/// API version stored with each analysis
pub fn api_version() -> &'static str {
    API_VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload() -> Upload {
        Upload {
            file_name: "walk.zip".to_string(),
            bytes: vec![1, 2, 3],
            size: 3,
            sha256: "abc".to_string(),
        }
    }

    fn prediction(label: &str) -> Prediction {
        Prediction {
            score: 0.5,
            threshold: 1.3,
            windows: 4,
            label: label.to_string(),
        }
    }

    #[test]
    fn test_healthy_labels() {
        assert_eq!(Classification::from_label("Sain"), Classification::Healthy);
        assert_eq!(Classification::from_label(" healthy "), Classification::Healthy);
        assert_eq!(Classification::from_label("Parkinson"), Classification::AtRisk);
        assert_eq!(Classification::from_label(""), Classification::AtRisk);
    }

    #[test]
    fn test_classification_serde_names() {
        let json = serde_json::to_string(&Classification::AtRisk).unwrap();
        assert_eq!(json, "\"at-risk\"");
        let parsed: Classification = serde_json::from_str("\"healthy\"").unwrap();
        assert_eq!(parsed, Classification::Healthy);
    }

    #[test]
    fn test_live_outcome_to_new_analysis() {
        let outcome = AnalysisOutcome::live(prediction("Sain"), &upload(), 820);
        assert!(!outcome.is_demo());
        assert!(outcome.fallback_cause.is_none());

        let record = outcome.to_new_analysis();
        assert_eq!(record.file_name, "walk.zip");
        assert_eq!(record.result, Classification::Healthy);
        assert_eq!(record.windows, 4);
        assert_eq!(record.analysis_time, 820);
        assert_eq!(record.file_sha256.as_deref(), Some("abc"));
        assert_eq!(record.source, PredictionSource::Live);
    }

    #[test]
    fn test_demo_outcome_is_labelled() {
        let outcome = AnalysisOutcome::demo(
            prediction("Parkinson"),
            &upload(),
            0,
            "connection refused".to_string(),
        );
        assert!(outcome.is_demo());
        assert_eq!(outcome.classification, Classification::AtRisk);
        assert_eq!(outcome.to_new_analysis().source, PredictionSource::Demo);
    }
}
