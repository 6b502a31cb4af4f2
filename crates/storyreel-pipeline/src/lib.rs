//! Pipeline stages and CLI plumbing for StoryReel.
//!
//! Each stage reads one JSON message, runs its batch of work items
//! against a generation provider, and writes one JSON message:
//! - [`stages`]: the parse / image / video / music / aggregate stages
//! - [`runner`]: shared submit, poll and download orchestration per batch
//! - [`report`]: run report persistence
//! - [`io`]: the one-message stdin/stdout contract

pub mod config;
pub mod error;
pub mod io;
pub mod report;
pub mod runner;
pub mod stages;

pub use config::PipelineConfig;
pub use error::{StageError, StageResult};
pub use report::ReportWriter;
pub use runner::StageRunner;
