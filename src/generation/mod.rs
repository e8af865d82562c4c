use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::constants;

/// Errors from the text generation backend. These never reach API callers;
/// the model service consumes them and falls back to deterministic models.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("transport error: {0}")]
    TransportError(#[from] reqwest::Error),

    #[error("generation timed out after {0} seconds")]
    Timeout(u64),

    #[error("inference API returned status {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Sampling parameters for a single generation call
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GenerationParams {
    pub max_new_tokens: u32,
    pub temperature: f64,
}

/// Black-box text generation capability, injected into the model service
/// so tests can substitute a stub
#[async_trait]
pub trait TextGeneration: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GenerationError>;
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Serialize)]
struct InferenceParameters {
    max_new_tokens: u32,
    temperature: f64,
    return_full_text: bool,
}

#[derive(Deserialize)]
struct InferenceOutput {
    generated_text: String,
}

/// Hugging Face hosted inference backend
pub struct HuggingFaceBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl HuggingFaceBackend {
    pub fn new(api_key: String, model: String) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(constants::GENERATION_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url: "https://api-inference.huggingface.co/models".to_string(),
        })
    }

    /// Override the inference endpoint, for tests against a local server
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGeneration for HuggingFaceBackend {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GenerationError> {
        let url = format!("{}/{}", self.base_url, self.model);
        debug!("Calling inference API: {} (max_new_tokens={})", self.model, params.max_new_tokens);

        let body = InferenceRequest {
            inputs: prompt,
            parameters: InferenceParameters {
                max_new_tokens: params.max_new_tokens,
                temperature: params.temperature,
                return_full_text: false,
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout(constants::GENERATION_TIMEOUT_SECS)
                } else {
                    GenerationError::TransportError(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GenerationError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let outputs: Vec<InferenceOutput> = response
            .json()
            .await
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        outputs
            .into_iter()
            .next()
            .map(|o| o.generated_text)
            .ok_or_else(|| {
                GenerationError::MalformedResponse("empty generation result".to_string())
            })
    }
}
