//! Work items and per-item results.

use serde::{Deserialize, Serialize};

use crate::FrameId;

/// One unit of generation work flowing through a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Id assigned at batch-parse time; never changes downstream
    pub item_id: FrameId,

    /// Generation prompt (may be empty)
    pub prompt: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,

    /// Video duration in seconds, as the provider expects it (string)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,

    /// Generation mode, e.g. `std` or `pro`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// Local artifact this item derives from; required input for
    /// image-to-video work, absent for text-to-image work
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_artifact_path: Option<String>,
}

impl WorkItem {
    /// Create a minimal item; optional fields start unset.
    pub fn new(item_id: FrameId, prompt: impl Into<String>) -> Self {
        Self {
            item_id,
            prompt: prompt.into(),
            negative_prompt: None,
            aspect_ratio: None,
            duration: None,
            seed: None,
            mode: None,
            source_artifact_path: None,
        }
    }
}

/// Outcome classification for one work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Artifact produced and stored locally
    Success,
    /// Submit, poll, or download failed
    Failed,
    /// Precondition missing; no remote call was made
    Skipped,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Success => "success",
            ItemStatus::Failed => "failed",
            ItemStatus::Skipped => "skipped",
        }
    }
}

/// Outcome of one work item, always produced regardless of sibling items.
///
/// Exactly one of `output_path` / `error_reason` is set: success carries the
/// path, failed and skipped carry the reason. Build these through the
/// constructors so the pairing stays valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResult {
    pub item_id: FrameId,

    pub status: ItemStatus,

    /// Local path of the produced artifact (success only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,

    /// What went wrong, or why the item was skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,

    /// The originating item, for traceability
    pub item: WorkItem,
}

impl ItemResult {
    /// Item produced its artifact at `output_path`.
    pub fn success(item: WorkItem, output_path: impl Into<String>) -> Self {
        Self {
            item_id: item.item_id.clone(),
            status: ItemStatus::Success,
            output_path: Some(output_path.into()),
            error_reason: None,
            item,
        }
    }

    /// Item failed; the batch continues.
    pub fn failed(item: WorkItem, reason: impl Into<String>) -> Self {
        Self {
            item_id: item.item_id.clone(),
            status: ItemStatus::Failed,
            output_path: None,
            error_reason: Some(reason.into()),
            item,
        }
    }

    /// Item was skipped before any remote call.
    pub fn skipped(item: WorkItem, reason: impl Into<String>) -> Self {
        Self {
            item_id: item.item_id.clone(),
            status: ItemStatus::Skipped,
            output_path: None,
            error_reason: Some(reason.into()),
            item,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ItemStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> WorkItem {
        WorkItem::new(FrameId::from_string(id), "a prompt")
    }

    #[test]
    fn test_success_carries_path_only() {
        let r = ItemResult::success(item("frame_1"), "out/frame_1.png");
        assert_eq!(r.status, ItemStatus::Success);
        assert_eq!(r.output_path.as_deref(), Some("out/frame_1.png"));
        assert!(r.error_reason.is_none());
        assert!(r.is_success());
    }

    #[test]
    fn test_failed_carries_reason_only() {
        let r = ItemResult::failed(item("frame_2"), "poll timed out");
        assert_eq!(r.status, ItemStatus::Failed);
        assert!(r.output_path.is_none());
        assert_eq!(r.error_reason.as_deref(), Some("poll timed out"));
    }

    #[test]
    fn test_skipped_carries_reason_only() {
        let r = ItemResult::skipped(item("frame_3"), "No image available");
        assert_eq!(r.status, ItemStatus::Skipped);
        assert!(r.output_path.is_none());
        assert_eq!(r.error_reason.as_deref(), Some("No image available"));
        assert!(!r.is_success());
    }

    #[test]
    fn test_item_id_matches_item() {
        let r = ItemResult::failed(item("frame_9"), "boom");
        assert_eq!(r.item_id, r.item.item_id);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ItemStatus::Skipped).unwrap(),
            "\"skipped\""
        );
        assert_eq!(ItemStatus::Failed.as_str(), "failed");
    }
}
