//! Optional prompt enhancement through a Dify workflow.
//!
//! Enhancement is best-effort: any failure keeps the original prompt,
//! so a misconfigured or unreachable workflow never fails a run.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};

const DEFAULT_BASE_URL: &str = "https://api.dify.ai/v1";

#[derive(Debug, Serialize)]
struct WorkflowRequest<'a> {
    inputs: WorkflowInputs<'a>,
    response_mode: &'a str,
}

#[derive(Debug, Serialize)]
struct WorkflowInputs<'a> {
    text: &'a str,
}

/// Dify workflow client that rewrites prompts before submission.
pub struct DifyEnhancer {
    api_key: String,
    base_url: String,
    client: Client,
    request_timeout: Duration,
}

impl DifyEnhancer {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            client: Client::new(),
            request_timeout: Duration::from_secs(
                std::env::var("REQUEST_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Build an enhancer from the environment, or `None` when the
    /// feature is not configured.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("DIFY_API_KEY")
            .ok()
            .filter(|s| !s.is_empty())?;
        let base_url = std::env::var("DIFY_API_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Some(Self::new(api_key, base_url))
    }

    /// Enhance a prompt, falling back to the original on any failure.
    pub async fn enhance(&self, prompt: &str) -> String {
        match self.try_enhance(prompt).await {
            Ok(enhanced) => {
                debug!("Prompt enhanced");
                enhanced
            }
            Err(e) => {
                warn!(error = %e, "Prompt enhancement failed, using original prompt");
                prompt.to_string()
            }
        }
    }

    async fn try_enhance(&self, prompt: &str) -> ProviderResult<String> {
        let url = format!("{}/workflows/run", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.request_timeout)
            .json(&WorkflowRequest {
                inputs: WorkflowInputs { text: prompt },
                response_mode: "blocking",
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::api(status, body));
        }

        let body: Value = response.json().await?;
        if let Some(error) = body.get("error") {
            return Err(ProviderError::invalid_response(format!(
                "workflow error: {}",
                error
            )));
        }

        Ok(body
            .get("output")
            .and_then(|o| o.get("enhanced_prompt"))
            .and_then(|p| p.as_str())
            .unwrap_or(prompt)
            .to_string())
    }
}
