//! Music stage: compose one background track.

use tracing::warn;

use storyreel_models::{FrameId, MusicMetadata, MusicOutput, WorkItem};
use storyreel_provider::{ArtifactFetcher, BeatovenClient};

use crate::config::PipelineConfig;
use crate::runner::StageRunner;

/// Prompt used when none is supplied.
pub const DEFAULT_PROMPT: &str =
    "Create a calming, atmospheric background music suitable for video content";

/// Compose one track from `prompt` (or the default).
///
/// The track is its own single-item batch: the same submit/poll/download
/// path as the frame stages, keyed by the output filename.
pub async fn run(
    config: &PipelineConfig,
    prompt: Option<&str>,
    duration: Option<u32>,
    filename: Option<&str>,
) -> MusicOutput {
    let prompt = match prompt {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => {
            warn!("No music prompt provided, using the default prompt");
            DEFAULT_PROMPT.to_string()
        }
    };
    let filename = filename.unwrap_or(&config.music_filename);

    let metadata = MusicMetadata {
        prompt: prompt.clone(),
        format: config.music_format.clone(),
        duration: duration.unwrap_or(config.music_duration),
        filename: filename.to_string(),
    };

    let mut item = WorkItem::new(FrameId::from_string(filename), &prompt);
    item.duration = duration.map(|d| d.to_string());

    let runner = StageRunner::new(
        BeatovenClient::from_env(),
        ArtifactFetcher::from_env(),
        config.retry.clone(),
        config.poll.clone(),
        config.music_dir(),
        config.music_format.as_str(),
    );

    let mut results = runner.run_batch(std::slice::from_ref(&item)).await;
    let result = results.remove(0);

    match result.output_path {
        Some(path) => MusicOutput::success(path, metadata),
        None => MusicOutput::error(
            result
                .error_reason
                .unwrap_or_else(|| "Failed to generate music".to_string()),
            metadata,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use storyreel_models::MessageStatus;
    use storyreel_provider::RetryConfig;

    fn clear_env() {
        for key in [
            "BEATOVEN_API_KEY",
            "BEATOVEN_API_URL",
            "DEFAULT_DURATION",
            "DEFAULT_FORMAT",
            "DOWNLOAD_TIMEOUT",
            "REQUEST_TIMEOUT",
        ] {
            std::env::remove_var(key);
        }
    }

    fn test_config(output_dir: &std::path::Path) -> PipelineConfig {
        PipelineConfig {
            output_dir: output_dir.to_path_buf(),
            retry: RetryConfig {
                max_retries: 0,
                base_delay_ms: 1,
                max_delay_ms: 1,
            },
            ..Default::default()
        }
    }

    async fn mount_composition(server: &MockServer, artifact_url: &str) {
        Mock::given(method("POST"))
            .and(path("/tracks/compose"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "task_id": "compose-1" })),
            )
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/tasks/compose-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "completed",
                "meta": { "track_url": artifact_url }
            })))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/track.mp3"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp3-bytes".to_vec()))
            .mount(server)
            .await;
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_key_is_error_with_default_prompt() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();

        let output = run(&test_config(dir.path()), None, None, None).await;

        assert_eq!(output.status, MessageStatus::Error);
        assert!(output
            .error
            .as_deref()
            .unwrap()
            .contains("BEATOVEN_API_KEY"));
        assert!(output.music_path.is_none());
        assert_eq!(output.metadata.prompt, DEFAULT_PROMPT);
        assert_eq!(output.metadata.duration, 180);
        assert_eq!(output.metadata.format, "mp3");
        assert_eq!(output.metadata.filename, "background_music");
    }

    #[tokio::test]
    #[serial]
    async fn test_composes_track_with_requested_duration() {
        clear_env();
        let server = MockServer::start().await;
        std::env::set_var("BEATOVEN_API_KEY", "bk");
        std::env::set_var("BEATOVEN_API_URL", server.uri());
        let dir = tempfile::tempdir().unwrap();
        mount_composition(&server, &format!("{}/track.mp3", server.uri())).await;

        let output = run(
            &test_config(dir.path()),
            Some("epic orchestral build"),
            Some(240),
            None,
        )
        .await;

        assert_eq!(output.status, MessageStatus::Success);
        let music_path = output.music_path.as_deref().unwrap();
        assert!(music_path.ends_with("background_music.mp3"));
        assert!(std::path::Path::new(music_path).exists());
        assert_eq!(output.metadata.duration, 240);
        assert_eq!(output.metadata.prompt, "epic orchestral build");

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["prompt"]["text"], "epic orchestral build");
        assert_eq!(body["duration"], 240);

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn test_custom_filename_names_the_artifact() {
        clear_env();
        let server = MockServer::start().await;
        std::env::set_var("BEATOVEN_API_KEY", "bk");
        std::env::set_var("BEATOVEN_API_URL", server.uri());
        let dir = tempfile::tempdir().unwrap();
        mount_composition(&server, &format!("{}/track.mp3", server.uri())).await;

        let output = run(
            &test_config(dir.path()),
            Some("soft piano"),
            None,
            Some("theme"),
        )
        .await;

        assert_eq!(output.status, MessageStatus::Success);
        assert!(output
            .music_path
            .as_deref()
            .unwrap()
            .ends_with("theme.mp3"));
        assert_eq!(output.metadata.filename, "theme");

        clear_env();
    }
}
