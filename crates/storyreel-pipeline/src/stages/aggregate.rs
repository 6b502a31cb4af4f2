//! Aggregate stage: join the video and music messages into a run report.

use tracing::{error, info};

use storyreel_models::{
    generate_run_id, AggregateInput, AggregateOutput, MessageStatus, RunReport, RunSummary,
};

use crate::config::PipelineConfig;
use crate::report::ReportWriter;

/// Build and persist the run report, then emit the final message.
///
/// A failed persistence still emits the computed summary; only
/// `log_file` is cleared, since no file was written.
pub fn run(config: &PipelineConfig, input: AggregateInput) -> AggregateOutput {
    let run_id = generate_run_id();
    let mut report = RunReport::build(run_id, input.video_frame_in, input.music_track_in);

    let writer = ReportWriter::new(&config.log_dir);
    match writer.persist(&mut report) {
        Ok(path) => {
            info!(
                run_id = %report.run_id,
                successful = report.summary.successful_videos,
                failed = report.summary.failed_videos,
                path = %path.display(),
                "Run aggregated"
            );
            AggregateOutput {
                status: MessageStatus::Success,
                run_id: report.run_id.clone(),
                video_paths: report.successful_video_paths(),
                music_path: report.music_path().map(String::from),
                error: None,
                summary: report.summary,
            }
        }
        Err(e) => {
            error!(run_id = %report.run_id, error = %e, "Cannot persist run report");
            report.summary.log_file = None;
            AggregateOutput {
                status: MessageStatus::Error,
                run_id: report.run_id.clone(),
                video_paths: report.successful_video_paths(),
                music_path: report.music_path().map(String::from),
                error: Some(e.to_string()),
                summary: report.summary,
            }
        }
    }
}

/// Output for an input message that could not be read at all.
pub fn input_error(err: impl Into<String>) -> AggregateOutput {
    AggregateOutput {
        status: MessageStatus::Error,
        run_id: generate_run_id(),
        summary: RunSummary {
            total_frames: 0,
            successful_videos: 0,
            failed_videos: 0,
            music_generated: false,
            log_file: None,
        },
        video_paths: Vec::new(),
        music_path: None,
        error: Some(err.into()),
    }
}
