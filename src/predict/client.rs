// HTTP client for the prediction endpoint

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::time::Duration;

use super::{Prediction, PredictError, Upload};
use crate::config::ApiConfig;
use crate::util::truncate_utf8_safe;

/// Longest error body kept for display
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Clone)]
pub struct PredictClient {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl PredictClient {
    pub fn new(config: &ApiConfig) -> Result<Self, PredictError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .user_agent(crate::analysis::client_id())
            .build()?;

        Ok(Self {
            client,
            url: config.predict_url(),
            token: config.token.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST the archive as multipart field `file` and parse the prediction
    pub async fn submit(&self, upload: &Upload) -> Result<Prediction, PredictError> {
        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str("application/zip")?;
        let form = Form::new().part("file", part);

        let mut request = self.client.post(&self.url).multipart(form);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        tracing::debug!(
            "Submitting {} ({} bytes) to {}",
            upload.file_name,
            upload.size,
            self.url
        );
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(PredictError::Unauthorized(status));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PredictError::Status {
                status,
                body: truncate_utf8_safe(&body, MAX_ERROR_BODY).to_string(),
            });
        }

        let body = response.text().await?;
        let prediction: Prediction =
            serde_json::from_str(&body).map_err(|e| PredictError::Malformed(e.to_string()))?;
        if !prediction.score.is_finite() || !prediction.threshold.is_finite() {
            return Err(PredictError::Malformed(
                "score and threshold must be finite numbers".to_string(),
            ));
        }

        tracing::info!(
            "Prediction for {}: score {:.6}, threshold {:.6}, {} windows, {}",
            upload.file_name,
            prediction.score,
            prediction.threshold,
            prediction.windows,
            prediction.label
        );
        Ok(prediction)
    }
}
