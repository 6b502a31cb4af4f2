//! Stage-to-stage pipeline messages.
//!
//! Every stage writes exactly one of these documents to stdout and the next
//! stage reads it from stdin. All of them carry a top-level `status`; error
//! outputs add an `error` string but keep the same parseable shape, so a
//! downstream stage never sees unparseable input from a stage that started.

use serde::{Deserialize, Serialize};

use crate::report::RunSummary;
use crate::{FrameId, ItemResult, ItemStatus, Keyframe};

/// Top-level status of a stage output message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Success,
    Error,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Success => "success",
            MessageStatus::Error => "error",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MessageStatus::Success)
    }
}

// ==================== Parse stage ====================

/// Parameters the parse stage ran with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseMetadata {
    pub source_file: String,
    pub default_aspect_ratio: String,
    pub frame_id_prefix: String,
}

/// Output of the parse stage: the keyframes to generate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseOutput {
    pub status: MessageStatus,
    #[serde(default)]
    pub keyframes: Vec<Keyframe>,
    #[serde(default)]
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metadata: ParseMetadata,
}

impl ParseOutput {
    /// A readable file always yields success, even with zero keyframes.
    pub fn success(keyframes: Vec<Keyframe>, metadata: ParseMetadata) -> Self {
        Self {
            status: MessageStatus::Success,
            count: keyframes.len(),
            keyframes,
            error: None,
            metadata,
        }
    }

    pub fn error(err: impl Into<String>, metadata: ParseMetadata) -> Self {
        Self {
            status: MessageStatus::Error,
            keyframes: Vec::new(),
            count: 0,
            error: Some(err.into()),
            metadata,
        }
    }
}

// ==================== Image stage ====================

/// Per-frame record emitted by the image stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub frame_id: FrameId,

    /// Explicit frame number or 1-based index among kept keyframes
    pub frame_number: u32,

    /// Prompt the image was generated from
    pub prompt: String,

    /// Local image path (success only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,

    pub status: ItemStatus,

    /// Failure or skip reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// The keyframe this record was generated from
    pub original_keyframe: Keyframe,
}

impl FrameRecord {
    /// Build the wire record from a finished item.
    pub fn from_result(result: ItemResult, frame_number: u32, original_keyframe: Keyframe) -> Self {
        Self {
            frame_id: result.item_id,
            frame_number,
            prompt: result.item.prompt,
            image_path: result.output_path,
            status: result.status,
            reason: result.error_reason,
            original_keyframe,
        }
    }
}

/// Parameters the image stage ran with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub model_name: String,
    pub output_dir: String,
}

/// Output of the image stage: one record per keyframe, input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageOutput {
    pub status: MessageStatus,
    #[serde(default)]
    pub frames: Vec<FrameRecord>,
    #[serde(default)]
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metadata: ImageMetadata,
}

impl ImageOutput {
    pub fn success(frames: Vec<FrameRecord>, metadata: ImageMetadata) -> Self {
        Self {
            status: MessageStatus::Success,
            count: frames.len(),
            frames,
            error: None,
            metadata,
        }
    }

    pub fn error(err: impl Into<String>, metadata: ImageMetadata) -> Self {
        Self {
            status: MessageStatus::Error,
            frames: Vec::new(),
            count: 0,
            error: Some(err.into()),
            metadata,
        }
    }
}

// ==================== Video stage ====================

/// Per-frame record emitted by the video stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub frame_id: FrameId,

    /// Source image the video was animated from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,

    /// Local video path (success only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_path: Option<String>,

    /// Prompt the video was generated from (after optional enhancement)
    pub prompt: String,

    pub status: ItemStatus,

    /// Failure or skip reason, e.g. `No image available`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// The image-stage record this one was derived from
    pub original_frame: FrameRecord,
}

impl VideoRecord {
    /// Build the wire record from a finished item.
    pub fn from_result(result: ItemResult, original_frame: FrameRecord) -> Self {
        Self {
            frame_id: result.item_id,
            image_path: result.item.source_artifact_path,
            video_path: result.output_path,
            prompt: result.item.prompt,
            status: result.status,
            reason: result.error_reason,
            original_frame,
        }
    }
}

/// Parameters the video stage ran with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub model_name: String,
    pub output_dir: String,
    pub mode: String,
    pub duration: String,
    pub dify_used: bool,
}

/// Output of the video stage: one record per incoming frame, input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoOutput {
    pub status: MessageStatus,
    #[serde(default)]
    pub videos: Vec<VideoRecord>,
    #[serde(default)]
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metadata: VideoMetadata,
}

impl VideoOutput {
    pub fn success(videos: Vec<VideoRecord>, metadata: VideoMetadata) -> Self {
        Self {
            status: MessageStatus::Success,
            count: videos.len(),
            videos,
            error: None,
            metadata,
        }
    }

    pub fn error(err: impl Into<String>, metadata: VideoMetadata) -> Self {
        Self {
            status: MessageStatus::Error,
            videos: Vec::new(),
            count: 0,
            error: Some(err.into()),
            metadata,
        }
    }
}

// ==================== Music stage ====================

/// Parameters the music stage ran with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicMetadata {
    pub prompt: String,
    pub format: String,
    /// Track length in seconds
    pub duration: u32,
    pub filename: String,
}

/// Output of the music stage: at most one track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicOutput {
    pub status: MessageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub music_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metadata: MusicMetadata,
}

impl MusicOutput {
    pub fn success(music_path: impl Into<String>, metadata: MusicMetadata) -> Self {
        Self {
            status: MessageStatus::Success,
            music_path: Some(music_path.into()),
            error: None,
            metadata,
        }
    }

    pub fn error(err: impl Into<String>, metadata: MusicMetadata) -> Self {
        Self {
            status: MessageStatus::Error,
            music_path: None,
            error: Some(err.into()),
            metadata,
        }
    }

    /// Whether this message represents a usable track on disk.
    pub fn has_track(&self) -> bool {
        self.status.is_success() && self.music_path.is_some()
    }
}

// ==================== Aggregate stage ====================

/// Input to the aggregate stage: the two independent upstream messages,
/// joined only here, with no required temporal order between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateInput {
    pub video_frame_in: VideoOutput,
    /// Absent when the music stage never ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub music_track_in: Option<MusicOutput>,
}

/// Output of the aggregate stage: run summary plus the produced paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateOutput {
    pub status: MessageStatus,
    pub run_id: String,
    pub summary: RunSummary,
    /// Video paths of successful frames, input order
    #[serde(default)]
    pub video_paths: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub music_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
