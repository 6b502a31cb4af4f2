//! Beatoven composition API client.
//!
//! A single compose call returns a task id; the task endpoint reports
//! progress until the composed track URL appears in the metadata.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use storyreel_models::WorkItem;

use crate::error::{ProviderError, ProviderResult};
use crate::job::{JobClient, JobHandle, JobStatus, Provider};

const DEFAULT_BASE_URL: &str = "https://api.beatoven.ai/v1";

/// Beatoven API configuration.
#[derive(Debug, Clone)]
pub struct BeatovenConfig {
    pub api_key: String,
    pub base_url: String,
    pub request_timeout: Duration,
    /// Track length in seconds when the work item has none
    pub duration: u32,
    pub format: String,
}

impl BeatovenConfig {
    /// Read configuration from the environment. `Err` carries the
    /// unavailability reason used to fail the stage's items.
    pub fn from_env() -> Result<Self, String> {
        let api_key = std::env::var("BEATOVEN_API_KEY")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "BEATOVEN_API_KEY is not set".to_string())?;

        let request_timeout = std::env::var("REQUEST_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        Ok(Self {
            api_key,
            base_url: std::env::var("BEATOVEN_API_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            request_timeout: Duration::from_secs(request_timeout),
            duration: std::env::var("DEFAULT_DURATION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(180),
            format: std::env::var("DEFAULT_FORMAT").unwrap_or_else(|_| "mp3".to_string()),
        })
    }
}

#[derive(Debug, Serialize)]
struct ComposeRequest<'a> {
    prompt: TextPrompt<'a>,
    duration: u32,
    format: &'a str,
}

#[derive(Debug, Serialize)]
struct TextPrompt<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ComposeResponse {
    task_id: String,
}

#[derive(Debug, Deserialize)]
struct TaskResponse {
    #[serde(default)]
    status: String,
    meta: Option<TaskMeta>,
}

#[derive(Debug, Deserialize)]
struct TaskMeta {
    track_url: Option<String>,
}

/// Beatoven API client.
pub struct BeatovenClient {
    config: BeatovenConfig,
    client: Client,
}

impl BeatovenClient {
    pub fn new(config: BeatovenConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    pub fn provider(config: Result<BeatovenConfig, String>) -> Provider<Self> {
        match config {
            Ok(config) => Provider::Ready(Self::new(config)),
            Err(reason) => {
                warn!(reason = %reason, "Beatoven provider unavailable");
                Provider::Unavailable(reason)
            }
        }
    }

    pub fn from_env() -> Provider<Self> {
        Self::provider(BeatovenConfig::from_env())
    }

    /// Track length for one item: its own duration when parseable,
    /// otherwise the configured default.
    fn duration_for(&self, item: &WorkItem) -> u32 {
        item.duration
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.config.duration)
    }

    async fn check_status(response: reqwest::Response) -> ProviderResult<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::api(status, body));
        }
        Ok(response)
    }
}

#[async_trait]
impl JobClient for BeatovenClient {
    async fn submit(&self, item: &WorkItem) -> ProviderResult<JobHandle> {
        let url = format!("{}/tracks/compose", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .timeout(self.config.request_timeout)
            .json(&ComposeRequest {
                prompt: TextPrompt { text: &item.prompt },
                duration: self.duration_for(item),
                format: &self.config.format,
            })
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let compose: ComposeResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_response(format!("bad compose response: {}", e)))?;

        debug!(item_id = %item.item_id, task_id = %compose.task_id, "Composition submitted");
        Ok(JobHandle::new(compose.task_id))
    }

    async fn poll(&self, handle: &JobHandle) -> ProviderResult<JobStatus> {
        let url = format!("{}/tasks/{}", self.config.base_url, handle.as_str());
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .timeout(self.config.request_timeout)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let task: TaskResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_response(format!("bad task response: {}", e)))?;

        Ok(match task.status.as_str() {
            "completed" => match task.meta.and_then(|m| m.track_url) {
                Some(artifact_url) => JobStatus::Succeeded { artifact_url },
                None => JobStatus::Failed {
                    message: "composition completed without a track url".to_string(),
                },
            },
            "failed" | "error" => JobStatus::Failed {
                message: format!("composition {}", task.status),
            },
            _ => JobStatus::Pending,
        })
    }
}
