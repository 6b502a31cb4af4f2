//! Shared data models for the StoryReel pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Frame identifiers and parsed keyframes (including the keyframe file grammar)
//! - Work items and per-item results
//! - Stage-to-stage pipeline messages
//! - The aggregated run report

pub mod ids;
pub mod item;
pub mod keyframe;
pub mod message;
pub mod report;

// Re-export common types
pub use ids::FrameId;
pub use item::{ItemResult, ItemStatus, WorkItem};
pub use keyframe::{parse_keyframes, Keyframe};
pub use message::{
    AggregateInput, AggregateOutput, FrameRecord, ImageMetadata, ImageOutput, MessageStatus,
    MusicMetadata, MusicOutput, ParseMetadata, ParseOutput, VideoMetadata, VideoOutput,
    VideoRecord,
};
pub use report::{generate_run_id, RunReport, RunSummary};
