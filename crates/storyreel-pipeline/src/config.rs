//! Pipeline configuration from the environment.

use std::path::PathBuf;
use std::time::Duration;

use storyreel_provider::{PollConfig, RetryConfig};

/// Settings shared by the pipeline stages.
///
/// Provider credentials are not here: each provider reads its own and
/// reports unavailability per stage, so one missing key never stops the
/// stages that do not need it.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root for generated artifacts; stages write to `images/`, `videos/`
    /// and `music/` below it
    pub output_dir: PathBuf,
    /// Where run reports are persisted
    pub log_dir: PathBuf,
    pub poll: PollConfig,
    pub retry: RetryConfig,
    /// Video generation mode, e.g. `std`
    pub default_mode: String,
    /// Video clip length in seconds, as the provider expects it
    pub video_duration: String,
    /// Whether video prompts go through the enhancement service
    pub use_dify: bool,
    /// Track length in seconds when none is requested
    pub music_duration: u32,
    pub music_format: String,
    pub music_filename: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            log_dir: PathBuf::from("logs"),
            poll: PollConfig::default(),
            retry: RetryConfig::default(),
            default_mode: "std".to_string(),
            video_duration: "5".to_string(),
            use_dify: false,
            music_duration: 180,
            music_format: "mp3".to_string(),
            music_filename: "background_music".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let interval = std::env::var("POLLING_INTERVAL")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);
        let max_wait = std::env::var("MAX_WAIT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(300);

        Self {
            output_dir: PathBuf::from(
                std::env::var("OUTPUT_DIR").unwrap_or_else(|_| "output".to_string()),
            ),
            log_dir: PathBuf::from(std::env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string())),
            poll: PollConfig::new(
                Duration::from_secs(max_wait),
                Duration::from_secs(interval),
            ),
            retry: RetryConfig::from_env(),
            default_mode: std::env::var("DEFAULT_MODE").unwrap_or_else(|_| "std".to_string()),
            // DEFAULT_DURATION is shared: the video stage reads it as a
            // string of seconds, the music stage as an integer.
            video_duration: std::env::var("DEFAULT_DURATION").unwrap_or_else(|_| "5".to_string()),
            use_dify: std::env::var("USE_DIFY")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(false),
            music_duration: std::env::var("DEFAULT_DURATION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(180),
            music_format: std::env::var("DEFAULT_FORMAT").unwrap_or_else(|_| "mp3".to_string()),
            music_filename: std::env::var("DEFAULT_FILENAME")
                .unwrap_or_else(|_| "background_music".to_string()),
        }
    }

    pub fn images_dir(&self) -> PathBuf {
        self.output_dir.join("images")
    }

    pub fn videos_dir(&self) -> PathBuf {
        self.output_dir.join("videos")
    }

    pub fn music_dir(&self) -> PathBuf {
        self.output_dir.join("music")
    }
}
