//! Parsed keyframes and the keyframe file grammar.
//!
//! Keyframe files are line-oriented: blocks of `key: value` lines separated
//! by `---` lines, with `#` comment lines. A block describes one frame to
//! generate; a block without a `prompt` key is dropped.

use serde::{Deserialize, Serialize};

use crate::FrameId;

/// One parsed block from a keyframe file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Explicit frame number, when the block declares one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_number: Option<u32>,

    /// Generation prompt (may be empty when given as `prompt:`)
    pub prompt: String,

    /// Negative prompt passed through to the provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,

    /// Aspect ratio, e.g. `16:9`; the parse stage fills the default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,

    /// Provider seed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,

    /// Free-form timestamp annotation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Keyframe {
    /// Frame number used for id assignment: the explicit number when given,
    /// otherwise the 1-based position among kept blocks.
    pub fn number_or_index(&self, index: usize) -> u32 {
        self.frame_number.unwrap_or(index as u32 + 1)
    }

    /// Id for this keyframe at `index` among kept blocks.
    pub fn frame_id(&self, prefix: &str, index: usize) -> FrameId {
        FrameId::new(prefix, self.number_or_index(index))
    }
}

/// Accumulates `key: value` lines until the block is flushed.
#[derive(Default)]
struct BlockBuilder {
    frame_number: Option<u32>,
    prompt: Option<String>,
    negative_prompt: Option<String>,
    aspect_ratio: Option<String>,
    seed: Option<i64>,
    timestamp: Option<String>,
}

impl BlockBuilder {
    /// A block is kept iff it has a `prompt` key, even an empty one.
    fn flush_into(&mut self, keyframes: &mut Vec<Keyframe>) {
        let block = std::mem::take(self);
        if let Some(prompt) = block.prompt {
            keyframes.push(Keyframe {
                frame_number: block.frame_number,
                prompt,
                negative_prompt: block.negative_prompt,
                aspect_ratio: block.aspect_ratio,
                seed: block.seed,
                timestamp: block.timestamp,
            });
        }
    }
}

/// Parse keyframe file content into blocks.
///
/// Unknown keys and lines without a `:` are ignored; integer fields with
/// unparseable values stay unset. Never fails: unparseable content just
/// yields fewer (or zero) keyframes.
pub fn parse_keyframes(content: &str) -> Vec<Keyframe> {
    let mut keyframes = Vec::new();
    let mut current = BlockBuilder::default();

    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with("---") {
            current.flush_into(&mut keyframes);
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_lowercase().as_str() {
            "frame" | "frame_number" => {
                if let Ok(n) = value.parse() {
                    current.frame_number = Some(n);
                }
            }
            "prompt" => current.prompt = Some(value.to_string()),
            "negative_prompt" => current.negative_prompt = Some(value.to_string()),
            "aspect_ratio" => current.aspect_ratio = Some(value.to_string()),
            "seed" => {
                if let Ok(n) = value.parse() {
                    current.seed = Some(n);
                }
            }
            "timestamp" => current.timestamp = Some(value.to_string()),
            _ => {}
        }
    }
    current.flush_into(&mut keyframes);

    keyframes
}
