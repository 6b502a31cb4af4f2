//! Image stage: one text-to-image task per keyframe.

use storyreel_models::{FrameRecord, ImageMetadata, ImageOutput, ParseOutput, WorkItem};
use storyreel_provider::{ArtifactFetcher, KlingClient, KlingConfig, KlingTaskKind};

use crate::config::PipelineConfig;
use crate::runner::StageRunner;
use crate::stages::resolve_model;

/// Parameters echoed in the image message metadata.
pub fn metadata(config: &PipelineConfig, model_override: Option<&str>) -> ImageMetadata {
    ImageMetadata {
        model_name: resolve_model(KlingTaskKind::TextToImage, model_override),
        output_dir: config.images_dir().display().to_string(),
    }
}

/// Generate one image per keyframe of the parse message.
pub async fn run(
    config: &PipelineConfig,
    input: ParseOutput,
    model_override: Option<&str>,
) -> ImageOutput {
    let metadata = metadata(config, model_override);

    if input.keyframes.is_empty() {
        return ImageOutput::error("No keyframes provided in input message", metadata);
    }

    let prefix = &input.metadata.frame_id_prefix;
    let items: Vec<WorkItem> = input
        .keyframes
        .iter()
        .enumerate()
        .map(|(idx, keyframe)| {
            let mut item = WorkItem::new(keyframe.frame_id(prefix, idx), &keyframe.prompt);
            item.negative_prompt = keyframe.negative_prompt.clone();
            item.aspect_ratio = keyframe.aspect_ratio.clone();
            item.seed = keyframe.seed;
            item
        })
        .collect();

    let provider = KlingClient::provider(
        KlingConfig::from_env().map(|mut c| {
            c.model_name = Some(metadata.model_name.clone());
            c
        }),
        KlingTaskKind::TextToImage,
    );
    let runner = StageRunner::new(
        provider,
        ArtifactFetcher::from_env(),
        config.retry.clone(),
        config.poll.clone(),
        config.images_dir(),
        "png",
    );

    let results = runner.run_batch(&items).await;

    let frames = results
        .into_iter()
        .zip(input.keyframes)
        .enumerate()
        .map(|(idx, (result, keyframe))| {
            let frame_number = keyframe.number_or_index(idx);
            FrameRecord::from_result(result, frame_number, keyframe)
        })
        .collect();

    ImageOutput::success(frames, metadata)
}
