//! Hosted text-classification adapter.
//!
//! Speaks the Hugging Face Inference API shape: `POST {"inputs": text}` and a
//! list of `{label, score}` candidates back (optionally nested one level).
//! Implements `ClassifierPort` by picking the highest-scoring label.

use crate::domain::{Classification, DomainError};
use crate::ports::ClassifierPort;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default model; the binary sentiment model the journal was built around.
pub const DEFAULT_MODEL: &str = "distilbert-base-uncased-finetuned-sst-2-english";

/// Inference endpoint for a model id.
pub fn default_api_url(model: &str) -> String {
    format!("https://api-inference.huggingface.co/models/{}", model)
}

/// HTTP sentiment classifier. Any endpoint accepting the same payload works,
/// including a locally hosted copy of the model.
pub struct InferenceApiClassifier {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl InferenceApiClassifier {
    /// Create a new classifier.
    ///
    /// # Arguments
    /// * `api_url` - Full model endpoint URL
    /// * `api_key` - Bearer token (may be empty for local endpoints)
    /// * `timeout` - Per-request timeout; expiry surfaces as a classification error
    pub fn new(api_url: String, api_key: String, timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::Classification(format!("HTTP client init failed: {}", e)))?;
        Ok(Self {
            client,
            api_url,
            api_key,
        })
    }

    /// Pick the top candidate out of a raw response body.
    fn parse_response(body: &str) -> Result<Classification, DomainError> {
        let parsed: InferenceResponse = serde_json::from_str(body).map_err(|e| {
            warn!(error = %e, body = %body.chars().take(200).collect::<String>(), "classifier JSON parse failed");
            DomainError::Classification(format!("Failed to parse classifier response: {}", e))
        })?;

        let candidates = match parsed {
            InferenceResponse::Nested(mut batches) => {
                if batches.is_empty() {
                    Vec::new()
                } else {
                    batches.swap_remove(0)
                }
            }
            InferenceResponse::Flat(candidates) => candidates,
            InferenceResponse::Error { error } => {
                return Err(DomainError::Classification(format!(
                    "classifier reported: {}",
                    error
                )));
            }
        };

        let top = candidates
            .into_iter()
            .filter(|c| c.score.is_finite())
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .ok_or_else(|| DomainError::Classification("No labels returned".to_string()))?;
        Classification::checked(top.label, top.score)
    }
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    options: InferenceOptions,
}

#[derive(Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
    Error { error: String },
}

#[derive(Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

#[async_trait::async_trait]
impl ClassifierPort for InferenceApiClassifier {
    async fn classify(&self, text: &str) -> Result<Classification, DomainError> {
        debug!(text_len = text.len(), url = %self.api_url, "sending text to classifier");

        let request = InferenceRequest {
            inputs: text,
            options: InferenceOptions {
                wait_for_model: true,
            },
        };

        let mut builder = self.client.post(&self.api_url).json(&request);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| DomainError::Classification(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %text, "classifier API returned error");
            return Err(DomainError::Classification(format!(
                "API error {}: {}",
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DomainError::Classification(format!("Failed to read response: {}", e)))?;
        let classification = Self::parse_response(&body)?;
        debug!(
            label = %classification.label,
            score = classification.score,
            "classification complete"
        );
        Ok(classification)
    }
}
