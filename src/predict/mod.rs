// Predict module - client for the remote motion-analysis model
//
// A submission uploads one ZIP archive of sensor recordings and gets back
// the reconstruction score of the autoencoder, its decision threshold, the
// number of windows scored and a label.

mod client;
mod upload;

pub use client::PredictClient;
pub use upload::{Upload, UploadError, MAX_UPLOAD_BYTES};

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version of the prediction API this client speaks
pub const API_VERSION: &str = "1.0";

/// Model output for one archive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Mean squared reconstruction error
    pub score: f64,
    pub threshold: f64,
    #[serde(alias = "totalWindows")]
    pub windows: u32,
    pub label: String,
}

/// Fixed prediction used when demo fallback is enabled
pub fn demo_prediction() -> Prediction {
    Prediction {
        score: 0.09340519458055496,
        threshold: 1.3764445960521698,
        windows: 3,
        label: "Sain".to_string(),
    }
}

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("The prediction service rejected the credentials (HTTP {})", .0.as_u16())]
    Unauthorized(StatusCode),

    #[error("HTTP error! status: {}", .status.as_u16())]
    Status { status: StatusCode, body: String },

    #[error("Malformed prediction response: {0}")]
    Malformed(String),
}

impl PredictError {
    /// Failures worth retrying later: connection problems and 5xx answers
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status { status, .. } => status.is_server_error(),
            Self::Unauthorized(_) | Self::Malformed(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_accepts_total_windows() {
        let p: Prediction = serde_json::from_str(
            r#"{"score": 0.2, "threshold": 1.37, "totalWindows": 6, "label": "Sain"}"#,
        )
        .unwrap();
        assert_eq!(p.windows, 6);
    }

    #[test]
    fn test_transient_classification() {
        let server = PredictError::Status {
            status: StatusCode::BAD_GATEWAY,
            body: String::new(),
        };
        let client = PredictError::Status {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            body: String::new(),
        };
        assert!(server.is_transient());
        assert!(!client.is_transient());
        assert!(!PredictError::Unauthorized(StatusCode::UNAUTHORIZED).is_transient());
        assert!(!PredictError::Malformed("eof".into()).is_transient());
        assert_eq!(server.to_string(), "HTTP error! status: 502");
    }

    #[test]
    fn test_demo_prediction_is_healthy() {
        let demo = demo_prediction();
        assert_eq!(demo.label, "Sain");
        assert!(demo.score < demo.threshold);
    }
}
