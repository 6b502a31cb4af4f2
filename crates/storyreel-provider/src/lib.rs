//! External generation providers for StoryReel.
//!
//! This crate provides:
//! - A uniform async job protocol: submit a work item, poll on a fixed
//!   cadence until a terminal status or the wait bound ([`job`], [`poll`])
//! - Submit-side retry with exponential backoff and jitter ([`retry`])
//! - Artifact download with partial-file cleanup ([`fetch`])
//! - Concrete clients: Kling image/video generation ([`kling`]),
//!   Beatoven music composition ([`beatoven`]), and optional Dify
//!   prompt enhancement ([`enhance`])

pub mod beatoven;
pub mod enhance;
pub mod error;
pub mod fetch;
pub mod job;
pub mod kling;
pub mod poll;
pub mod retry;

pub use beatoven::{BeatovenClient, BeatovenConfig};
pub use enhance::DifyEnhancer;
pub use error::{FetchError, FetchResult, PollError, ProviderError, ProviderResult};
pub use fetch::ArtifactFetcher;
pub use job::{JobClient, JobHandle, JobOutcome, JobStatus, Provider};
pub use kling::{KlingClient, KlingConfig, KlingTaskKind};
pub use poll::{await_completion, PollConfig};
pub use retry::{with_retry, RetryConfig};
