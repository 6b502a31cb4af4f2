//! Aggregated run reports.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::message::{MusicOutput, VideoOutput, VideoRecord};
use crate::ItemStatus;

/// Counters summarizing one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_frames: usize,
    pub successful_videos: usize,
    pub failed_videos: usize,
    pub music_generated: bool,
    /// Path of the persisted JSON report, once written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
}

/// The full record of one run: every video record, the music message, and
/// the derived summary. Created once per invocation, persisted once, never
/// mutated after persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub video_results: Vec<VideoRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub music_result: Option<MusicOutput>,
    pub summary: RunSummary,
}

impl RunReport {
    /// Derive a report from the two upstream messages.
    ///
    /// A frame counts as successful only when its status is success and a
    /// video path is present; failed and skipped frames both count as failed,
    /// so `successful_videos + failed_videos == total_frames` always holds.
    pub fn build(
        run_id: impl Into<String>,
        video: VideoOutput,
        music: Option<MusicOutput>,
    ) -> Self {
        let total = video.videos.len();
        let successful = video
            .videos
            .iter()
            .filter(|v| v.status == ItemStatus::Success && v.video_path.is_some())
            .count();
        let music_generated = music.as_ref().is_some_and(|m| m.has_track());

        Self {
            run_id: run_id.into(),
            timestamp: Utc::now(),
            video_results: video.videos,
            music_result: music,
            summary: RunSummary {
                total_frames: total,
                successful_videos: successful,
                failed_videos: total - successful,
                music_generated,
                log_file: None,
            },
        }
    }

    /// Video paths of successful frames, input order.
    pub fn successful_video_paths(&self) -> Vec<String> {
        self.video_results
            .iter()
            .filter(|v| v.status == ItemStatus::Success)
            .filter_map(|v| v.video_path.clone())
            .collect()
    }

    /// Path of the generated music track, when one exists.
    pub fn music_path(&self) -> Option<&str> {
        self.music_result
            .as_ref()
            .filter(|m| m.has_track())
            .and_then(|m| m.music_path.as_deref())
    }
}

/// Time-derived run id, e.g. `run_20250114_153022`.
pub fn generate_run_id() -> String {
    format!("run_{}", Local::now().format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{FrameRecord, MusicMetadata, VideoMetadata};
    use crate::{FrameId, Keyframe};

    fn video_record(id: &str, status: ItemStatus, video_path: Option<&str>) -> VideoRecord {
        let keyframe = Keyframe {
            frame_number: None,
            prompt: "p".to_string(),
            negative_prompt: None,
            aspect_ratio: Some("16:9".to_string()),
            seed: None,
            timestamp: None,
        };
        VideoRecord {
            frame_id: FrameId::from_string(id),
            image_path: Some(format!("imgs/{}.png", id)),
            video_path: video_path.map(String::from),
            prompt: "p".to_string(),
            status,
            reason: (status != ItemStatus::Success).then(|| "reason".to_string()),
            original_frame: FrameRecord {
                frame_id: FrameId::from_string(id),
                frame_number: 1,
                prompt: "p".to_string(),
                image_path: Some(format!("imgs/{}.png", id)),
                status: ItemStatus::Success,
                reason: None,
                original_keyframe: keyframe,
            },
        }
    }

    fn video_output(videos: Vec<VideoRecord>) -> VideoOutput {
        VideoOutput::success(
            videos,
            VideoMetadata {
                model_name: "kling-v1".to_string(),
                output_dir: "out".to_string(),
                mode: "std".to_string(),
                duration: "5".to_string(),
                dify_used: false,
            },
        )
    }

    fn music_metadata() -> MusicMetadata {
        MusicMetadata {
            prompt: "calm".to_string(),
            format: "mp3".to_string(),
            duration: 180,
            filename: "background_music".to_string(),
        }
    }

    #[test]
    fn test_summary_counts_partial_batch() {
        // 3 frames: 1 and 3 succeed, 2 fails
        let video = video_output(vec![
            video_record("frame_1", ItemStatus::Success, Some("v/frame_1.mp4")),
            video_record("frame_2", ItemStatus::Failed, None),
            video_record("frame_3", ItemStatus::Success, Some("v/frame_3.mp4")),
        ]);
        let report = RunReport::build("run_x", video, None);

        assert_eq!(report.summary.total_frames, 3);
        assert_eq!(report.summary.successful_videos, 2);
        assert_eq!(report.summary.failed_videos, 1);
        assert!(!report.summary.music_generated);
        assert_eq!(
            report.successful_video_paths(),
            vec!["v/frame_1.mp4", "v/frame_3.mp4"]
        );
    }

    #[test]
    fn test_skipped_counts_as_failed() {
        let video = video_output(vec![
            video_record("frame_1", ItemStatus::Skipped, None),
            video_record("frame_2", ItemStatus::Success, Some("v/frame_2.mp4")),
        ]);
        let report = RunReport::build("run_x", video, None);

        assert_eq!(report.summary.total_frames, 2);
        assert_eq!(report.summary.successful_videos, 1);
        assert_eq!(report.summary.failed_videos, 1);
        assert_eq!(
            report.summary.successful_videos + report.summary.failed_videos,
            report.summary.total_frames
        );
    }

    #[test]
    fn test_music_error_message_means_not_generated() {
        let video = video_output(vec![video_record(
            "frame_1",
            ItemStatus::Success,
            Some("v/frame_1.mp4"),
        )]);
        let music = MusicOutput::error("missing api key", music_metadata());
        let report = RunReport::build("run_x", video, Some(music));

        assert!(!report.summary.music_generated);
        assert!(report.music_path().is_none());
    }

    #[test]
    fn test_music_success_sets_generated_and_path() {
        let video = video_output(Vec::new());
        let music = MusicOutput::success("m/background_music.mp3", music_metadata());
        let report = RunReport::build("run_x", video, Some(music));

        assert!(report.summary.music_generated);
        assert_eq!(report.music_path(), Some("m/background_music.mp3"));
    }

    #[test]
    fn test_report_json_round_trip() {
        let video = video_output(vec![
            video_record("frame_1", ItemStatus::Success, Some("v/frame_1.mp4")),
            video_record("frame_2", ItemStatus::Failed, None),
        ]);
        let music = MusicOutput::success("m/track.mp3", music_metadata());
        let report = RunReport::build("run_20250114_153022", video, Some(music));

        let json = serde_json::to_string(&report).unwrap();
        let back: RunReport = serde_json::from_str(&json).unwrap();

        assert_eq!(back.run_id, report.run_id);
        assert_eq!(back.summary, report.summary);
        assert_eq!(back.video_results, report.video_results);
        assert_eq!(back.music_result, report.music_result);
    }

    #[test]
    fn test_generate_run_id_shape() {
        let id = generate_run_id();
        assert!(id.starts_with("run_"));
        // run_YYYYmmdd_HHMMSS
        assert_eq!(id.len(), "run_20250114_153022".len());
    }
}
