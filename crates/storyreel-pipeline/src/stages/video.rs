//! Video stage: animate each generated image into a clip.

use storyreel_models::{ImageOutput, VideoMetadata, VideoOutput, VideoRecord, WorkItem};
use storyreel_provider::{ArtifactFetcher, DifyEnhancer, KlingClient, KlingConfig, KlingTaskKind};

use crate::config::PipelineConfig;
use crate::runner::StageRunner;
use crate::stages::resolve_model;

/// Parameters echoed in the video message metadata.
pub fn metadata(config: &PipelineConfig) -> VideoMetadata {
    VideoMetadata {
        model_name: resolve_model(KlingTaskKind::ImageToVideo, None),
        output_dir: config.videos_dir().display().to_string(),
        mode: config.default_mode.clone(),
        duration: config.video_duration.clone(),
        dify_used: config.use_dify,
    }
}

/// Generate one video per frame of the image message.
///
/// Frames without an image are skipped before any enhancement or remote
/// call. When enhancement is enabled the record's prompt is the enhanced
/// one; `dify_used` reports the flag, not whether enhancement succeeded.
pub async fn run(config: &PipelineConfig, input: ImageOutput) -> VideoOutput {
    let metadata = metadata(config);

    if input.frames.is_empty() {
        return VideoOutput::error("No frames provided in input message", metadata);
    }

    let enhancer = if config.use_dify {
        DifyEnhancer::from_env()
    } else {
        None
    };

    let mut items = Vec::with_capacity(input.frames.len());
    for frame in &input.frames {
        let prompt = match &enhancer {
            Some(enhancer) if frame.image_path.is_some() => enhancer.enhance(&frame.prompt).await,
            _ => frame.prompt.clone(),
        };

        let mut item = WorkItem::new(frame.frame_id.clone(), prompt);
        item.mode = Some(config.default_mode.clone());
        item.duration = Some(config.video_duration.clone());
        item.source_artifact_path = frame.image_path.clone();
        items.push(item);
    }

    let provider = KlingClient::provider(
        KlingConfig::from_env().map(|mut c| {
            c.model_name = Some(metadata.model_name.clone());
            c
        }),
        KlingTaskKind::ImageToVideo,
    );
    let runner = StageRunner::new(
        provider,
        ArtifactFetcher::from_env(),
        config.retry.clone(),
        config.poll.clone(),
        config.videos_dir(),
        "mp4",
    )
    .require_source_artifact("No image available");

    let results = runner.run_batch(&items).await;

    let videos = results
        .into_iter()
        .zip(input.frames)
        .map(|(result, frame)| VideoRecord::from_result(result, frame))
        .collect();

    VideoOutput::success(videos, metadata)
}
