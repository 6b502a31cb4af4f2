//! Parse stage: keyframe file to the first pipeline message.

use std::path::Path;

use tracing::{info, warn};

use storyreel_models::{parse_keyframes, ParseMetadata, ParseOutput};

/// Parse `keyframes_file` into the parser message.
///
/// Keyframes without an aspect ratio get `default_aspect_ratio` here, so
/// downstream stages never re-derive the default. A readable file with no
/// keyframes is success with `count: 0`; only an unreadable file errors.
pub fn run(keyframes_file: &Path, default_aspect_ratio: &str, frame_id_prefix: &str) -> ParseOutput {
    let metadata = ParseMetadata {
        source_file: keyframes_file.display().to_string(),
        default_aspect_ratio: default_aspect_ratio.to_string(),
        frame_id_prefix: frame_id_prefix.to_string(),
    };

    let content = match std::fs::read_to_string(keyframes_file) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %keyframes_file.display(), error = %e, "Cannot read keyframes file");
            return ParseOutput::error(
                format!("cannot read {}: {}", keyframes_file.display(), e),
                metadata,
            );
        }
    };

    let mut keyframes = parse_keyframes(&content);
    for keyframe in &mut keyframes {
        if keyframe.aspect_ratio.is_none() {
            keyframe.aspect_ratio = Some(default_aspect_ratio.to_string());
        }
    }

    info!(count = keyframes.len(), path = %keyframes_file.display(), "Keyframes parsed");
    ParseOutput::success(keyframes, metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use storyreel_models::MessageStatus;

    fn write_keyframes(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parses_blocks_and_fills_default_aspect_ratio() {
        let file = write_keyframes(
            "# scene one\n\
             frame: 1\n\
             prompt: A sunrise over the hills\n\
             negative_prompt: blur\n\
             ---\n\
             prompt: A busy market street\n\
             aspect_ratio: 9:16\n\
             ---\n\
             note: no prompt here, block is dropped\n",
        );

        let output = run(file.path(), "16:9", "frame_");

        assert_eq!(output.status, MessageStatus::Success);
        assert_eq!(output.count, 2);
        assert_eq!(output.keyframes[0].frame_number, Some(1));
        assert_eq!(output.keyframes[0].aspect_ratio.as_deref(), Some("16:9"));
        assert_eq!(output.keyframes[1].aspect_ratio.as_deref(), Some("9:16"));
        assert_eq!(output.metadata.frame_id_prefix, "frame_");
    }

    #[test]
    fn test_empty_file_is_success_with_zero_count() {
        let file = write_keyframes("");
        let output = run(file.path(), "16:9", "frame_");

        assert_eq!(output.status, MessageStatus::Success);
        assert_eq!(output.count, 0);
        assert!(output.error.is_none());
    }

    #[test]
    fn test_unreadable_file_is_stage_error() {
        let output = run(Path::new("/nonexistent/keyframes.txt"), "16:9", "frame_");

        assert_eq!(output.status, MessageStatus::Error);
        assert!(output
            .error
            .as_deref()
            .unwrap()
            .contains("/nonexistent/keyframes.txt"));
        assert_eq!(output.metadata.source_file, "/nonexistent/keyframes.txt");
        assert_eq!(output.count, 0);
    }
}
