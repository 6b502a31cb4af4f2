//! Frame identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for one frame (or the music track) within a run.
///
/// Assigned once when a batch is parsed and carried unchanged through every
/// downstream stage; the aggregator joins per-item results on this key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(pub String);

impl FrameId {
    /// Build an id from a prefix and a frame number, e.g. `frame_3`.
    pub fn new(prefix: &str, frame_number: u32) -> Self {
        Self(format!("{}{}", prefix, frame_number))
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_id_from_prefix_and_number() {
        let id = FrameId::new("frame_", 3);
        assert_eq!(id.as_str(), "frame_3");
        assert_eq!(id.to_string(), "frame_3");
    }

    #[test]
    fn test_frame_id_serializes_as_plain_string() {
        let id = FrameId::from_string("frame_1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"frame_1\"");

        let back: FrameId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
