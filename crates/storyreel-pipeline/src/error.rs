use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by pipeline stages outside of per-item provider failures.
///
/// Per-item provider failures never become a `StageError`: they are carried
/// inside the output message so the batch keeps going.
#[derive(Debug, Error)]
pub enum StageError {
    /// A report file for this run id already exists.
    #[error("report already exists: {}", .0.display())]
    ReportExists(PathBuf),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StageResult<T> = Result<T, StageError>;
