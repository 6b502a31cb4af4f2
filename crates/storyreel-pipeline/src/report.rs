//! Run report persistence.
//!
//! Each run leaves two files in the log directory: `{run_id}.json` with the
//! full report and `{run_id}_summary.md` with a human-readable digest.
//! Reports are append-only; an existing file for the same run id is an
//! error, never an overwrite.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use storyreel_models::RunReport;

use crate::error::{StageError, StageResult};

/// Writes run reports to the log directory.
pub struct ReportWriter {
    log_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
        }
    }

    /// Persist `report` as JSON plus a markdown summary.
    ///
    /// `summary.log_file` is set to the JSON path before writing, so the
    /// persisted report names its own location. Returns the JSON path.
    pub fn persist(&self, report: &mut RunReport) -> StageResult<PathBuf> {
        std::fs::create_dir_all(&self.log_dir)?;

        let json_path = self.log_dir.join(format!("{}.json", report.run_id));
        let md_path = self.log_dir.join(format!("{}_summary.md", report.run_id));
        report.summary.log_file = Some(json_path.display().to_string());

        let mut file = create_new(&json_path)?;
        serde_json::to_writer_pretty(&mut file, report)?;
        file.flush()?;

        let mut summary = create_new(&md_path)?;
        summary.write_all(render_markdown(report).as_bytes())?;
        summary.flush()?;

        info!(path = %json_path.display(), "Run report persisted");
        Ok(json_path)
    }
}

fn create_new(path: &Path) -> StageResult<std::fs::File> {
    std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => StageError::ReportExists(path.to_path_buf()),
            _ => StageError::Io(e),
        })
}

/// Render the human-readable summary.
pub fn render_markdown(report: &RunReport) -> String {
    let summary = &report.summary;
    let mut lines: Vec<String> = vec![
        format!("# Workflow Results Summary - {}", report.run_id),
        format!("Generated on: {}", report.timestamp.to_rfc3339()),
        String::new(),
        "## Overview".to_string(),
        format!("- Total video frames: {}", summary.total_frames),
        format!("- Successful videos: {}", summary.successful_videos),
        format!("- Failed videos: {}", summary.failed_videos),
        format!(
            "- Music track generated: {}",
            if summary.music_generated { "Yes" } else { "No" }
        ),
        String::new(),
        "## Video Results".to_string(),
        String::new(),
    ];

    for video in &report.video_results {
        lines.push(format!("### {}", video.frame_id));
        lines.push(format!("- Status: {}", video.status.as_str()));
        lines.push(format!(
            "- Video: {}",
            video.video_path.as_deref().unwrap_or("Not available")
        ));
        lines.push(format!(
            "- Source image: {}",
            video.image_path.as_deref().unwrap_or("Not available")
        ));
        lines.push(format!("- Prompt: {}", truncate_prompt(&video.prompt)));
        lines.push(String::new());
    }

    if let Some(music) = &report.music_result {
        lines.push("## Music Result".to_string());
        lines.push(format!("- Status: {}", music.status.as_str()));
        lines.push(format!(
            "- File: {}",
            music.music_path.as_deref().unwrap_or("Not available")
        ));
        lines.push(format!("- Prompt: {}", truncate_prompt(&music.metadata.prompt)));
        lines.push(String::new());
    }

    lines.join("\n")
}

/// First 50 characters of a prompt, with an ellipsis when cut.
fn truncate_prompt(prompt: &str) -> String {
    let mut truncated: String = prompt.chars().take(50).collect();
    if prompt.chars().count() > 50 {
        truncated.push_str("...");
    }
    truncated
}
