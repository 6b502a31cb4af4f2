//! Kling-style generation API client.
//!
//! Two task families share one credential pair and envelope format:
//! text-to-image and image-to-video. Every request carries a short-lived
//! HS256 JWT minted from the access/secret key pair.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use storyreel_models::WorkItem;

use crate::error::{ProviderError, ProviderResult};
use crate::job::{JobClient, JobHandle, JobStatus, Provider};

const DEFAULT_BASE_URL: &str = "https://api.klingai.com";

/// Token lifetime in seconds.
const TOKEN_TTL_SECS: u64 = 1800;

/// Which Kling task family a client instance drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KlingTaskKind {
    TextToImage,
    ImageToVideo,
}

impl KlingTaskKind {
    /// API path used for both submit and poll.
    fn endpoint(&self) -> &'static str {
        match self {
            KlingTaskKind::TextToImage => "/v1/images/generations",
            KlingTaskKind::ImageToVideo => "/v1/videos/image2video",
        }
    }

    /// Model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            KlingTaskKind::TextToImage => "kling-v1-5",
            KlingTaskKind::ImageToVideo => "kling-v1",
        }
    }
}

/// Kling API configuration.
#[derive(Debug, Clone)]
pub struct KlingConfig {
    pub access_key: String,
    pub secret_key: String,
    pub base_url: String,
    /// Overrides the task kind's default model when set
    pub model_name: Option<String>,
    pub request_timeout: Duration,
}

impl KlingConfig {
    /// Read configuration from the environment.
    ///
    /// `Err` carries the reason the provider is unavailable. Missing
    /// credentials are reported to the caller, not a startup failure:
    /// the stage keeps running and fails items with this reason.
    pub fn from_env() -> Result<Self, String> {
        let access_key = std::env::var("KLING_ACCESS_KEY")
            .or_else(|_| std::env::var("ACCESSKEY_API"))
            .ok()
            .filter(|s| !s.is_empty());
        let secret_key = std::env::var("KLING_SECRET_KEY")
            .or_else(|_| std::env::var("ACCESSKEY_SECRET"))
            .ok()
            .filter(|s| !s.is_empty());

        let (access_key, secret_key) = match (access_key, secret_key) {
            (Some(a), Some(s)) => (a, s),
            _ => {
                return Err(
                    "Kling credentials not configured (set KLING_ACCESS_KEY and KLING_SECRET_KEY)"
                        .to_string(),
                )
            }
        };

        let request_timeout = std::env::var("KLING_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);

        Ok(Self {
            access_key,
            secret_key,
            base_url: std::env::var("KLING_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            model_name: std::env::var("KLING_MODEL_NAME").ok().filter(|s| !s.is_empty()),
            request_timeout: Duration::from_secs(request_timeout),
        })
    }
}

/// Claims of the per-request API token.
#[derive(Debug, Serialize)]
struct TokenClaims {
    iss: String,
    exp: u64,
    nbf: u64,
}

#[derive(Debug, Serialize)]
struct ImageGenerationRequest<'a> {
    model_name: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<&'a str>,
    n: u32,
    aspect_ratio: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i64>,
}

#[derive(Debug, Serialize)]
struct ImageToVideoRequest<'a> {
    model_name: &'a str,
    /// Base64 of the source image file
    image: String,
    prompt: &'a str,
    mode: &'a str,
    duration: &'a str,
}

/// Response envelope shared by submit and poll.
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    code: i64,
    #[serde(default)]
    message: String,
    data: Option<TaskData>,
}

#[derive(Debug, Deserialize)]
struct TaskData {
    task_id: String,
    #[serde(default)]
    task_status: String,
    #[serde(default)]
    task_status_msg: Option<String>,
    task_result: Option<TaskResult>,
}

#[derive(Debug, Deserialize)]
struct TaskResult {
    #[serde(default)]
    images: Vec<ArtifactRef>,
    #[serde(default)]
    videos: Vec<ArtifactRef>,
}

#[derive(Debug, Deserialize)]
struct ArtifactRef {
    url: String,
}

/// Kling API client for one task kind.
pub struct KlingClient {
    config: KlingConfig,
    kind: KlingTaskKind,
    client: Client,
}

impl KlingClient {
    pub fn new(config: KlingConfig, kind: KlingTaskKind) -> Self {
        Self {
            config,
            kind,
            client: Client::new(),
        }
    }

    /// Wrap a config lookup into provider availability: missing credentials
    /// become the unavailable state instead of an error.
    pub fn provider(config: Result<KlingConfig, String>, kind: KlingTaskKind) -> Provider<Self> {
        match config {
            Ok(config) => Provider::Ready(Self::new(config, kind)),
            Err(reason) => {
                warn!(reason = %reason, "Kling provider unavailable");
                Provider::Unavailable(reason)
            }
        }
    }

    /// Build a provider for `kind` straight from the environment.
    pub fn from_env(kind: KlingTaskKind) -> Provider<Self> {
        Self::provider(KlingConfig::from_env(), kind)
    }

    /// Configured model, or the task kind's default.
    pub fn model_name(&self) -> &str {
        self.config
            .model_name
            .as_deref()
            .unwrap_or_else(|| self.kind.default_model())
    }

    /// Mint the short-lived bearer token for one request.
    fn mint_token(&self) -> ProviderResult<String> {
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = TokenClaims {
            iss: self.config.access_key.clone(),
            exp: now + TOKEN_TTL_SECS,
            nbf: now.saturating_sub(5),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.secret_key.as_bytes()),
        )
        .map_err(|e| ProviderError::Auth(e.to_string()))
    }

    async fn parse_envelope(response: reqwest::Response) -> ProviderResult<TaskData> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::api(status, body));
        }

        let envelope: ApiEnvelope = response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_response(format!("bad envelope: {}", e)))?;

        if envelope.code != 0 {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body: format!("code {}: {}", envelope.code, envelope.message),
            });
        }
        envelope
            .data
            .ok_or_else(|| ProviderError::invalid_response("envelope has no task data"))
    }

    /// Map the provider's task status to the poll contract. Anything that
    /// is not a documented terminal status keeps the task pending.
    fn interpret(data: TaskData) -> JobStatus {
        match data.task_status.as_str() {
            "succeed" => {
                let url = data
                    .task_result
                    .map(|r| r.images.into_iter().chain(r.videos))
                    .and_then(|mut refs| refs.next())
                    .map(|a| a.url);
                match url {
                    Some(artifact_url) => JobStatus::Succeeded { artifact_url },
                    None => JobStatus::Failed {
                        message: "task succeeded without a result url".to_string(),
                    },
                }
            }
            "failed" => JobStatus::Failed {
                message: data
                    .task_status_msg
                    .unwrap_or_else(|| "task failed".to_string()),
            },
            _ => JobStatus::Pending,
        }
    }
}

#[async_trait]
impl JobClient for KlingClient {
    async fn submit(&self, item: &WorkItem) -> ProviderResult<JobHandle> {
        let url = format!("{}{}", self.config.base_url, self.kind.endpoint());
        let token = self.mint_token()?;
        let request = self
            .client
            .post(&url)
            .bearer_auth(token)
            .timeout(self.config.request_timeout);

        let response = match self.kind {
            KlingTaskKind::TextToImage => {
                request
                    .json(&ImageGenerationRequest {
                        model_name: self.model_name(),
                        prompt: &item.prompt,
                        negative_prompt: item.negative_prompt.as_deref(),
                        n: 1,
                        aspect_ratio: item.aspect_ratio.as_deref().unwrap_or("16:9"),
                        seed: item.seed,
                    })
                    .send()
                    .await?
            }
            KlingTaskKind::ImageToVideo => {
                let source = item.source_artifact_path.as_deref().ok_or_else(|| {
                    ProviderError::submit_failed("work item has no source artifact")
                })?;
                let bytes = tokio::fs::read(source).await.map_err(|e| {
                    ProviderError::submit_failed(format!(
                        "cannot read source image {}: {}",
                        source, e
                    ))
                })?;
                request
                    .json(&ImageToVideoRequest {
                        model_name: self.model_name(),
                        image: STANDARD.encode(bytes),
                        prompt: &item.prompt,
                        mode: item.mode.as_deref().unwrap_or("std"),
                        duration: item.duration.as_deref().unwrap_or("5"),
                    })
                    .send()
                    .await?
            }
        };

        let data = Self::parse_envelope(response).await?;
        debug!(item_id = %item.item_id, task_id = %data.task_id, "Task submitted");
        Ok(JobHandle::new(data.task_id))
    }

    async fn poll(&self, handle: &JobHandle) -> ProviderResult<JobStatus> {
        let url = format!(
            "{}{}/{}",
            self.config.base_url,
            self.kind.endpoint(),
            handle.as_str()
        );
        let token = self.mint_token()?;
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .timeout(self.config.request_timeout)
            .send()
            .await?;

        let data = Self::parse_envelope(response).await?;
        Ok(Self::interpret(data))
    }
}
