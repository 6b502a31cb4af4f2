//! The submit/poll contract shared by every generation provider.

use std::fmt;

use async_trait::async_trait;

use storyreel_models::WorkItem;

use crate::error::ProviderResult;

/// Opaque remote task reference returned on submission.
///
/// Owned by one poll sequence and discarded after a terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self(task_id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Remote task state as reported by one poll.
///
/// Unrecognized provider status strings map to `Pending`: polling continues
/// until a documented terminal state or the wait bound.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    /// Queued or running; keep polling
    Pending,
    /// Artifact is ready at the given URL
    Succeeded { artifact_url: String },
    /// The provider gave up on this task
    Failed { message: String },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }

    /// Terminal outcome, or `None` while still pending.
    pub fn into_outcome(self) -> Option<JobOutcome> {
        match self {
            JobStatus::Pending => None,
            JobStatus::Succeeded { artifact_url } => Some(JobOutcome::Succeeded { artifact_url }),
            JobStatus::Failed { message } => Some(JobOutcome::Failed { message }),
        }
    }
}

/// Terminal result of one completed poll sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Succeeded { artifact_url: String },
    Failed { message: String },
}

/// A remote generation provider: submit one item, then poll its task.
#[async_trait]
pub trait JobClient: Send + Sync {
    /// Submit one work item; returns the remote task handle.
    async fn submit(&self, item: &WorkItem) -> ProviderResult<JobHandle>;

    /// Ask the provider for the current state of a task.
    async fn poll(&self, handle: &JobHandle) -> ProviderResult<JobStatus>;
}

/// Construction-time availability of a provider.
///
/// Missing credentials make a provider `Unavailable` instead of failing
/// construction; the stage checks this once before the batch and fails
/// every item with the stored reason, without any remote call.
#[derive(Debug)]
pub enum Provider<C> {
    Ready(C),
    Unavailable(String),
}

impl<C> Provider<C> {
    pub fn as_ready(&self) -> Option<&C> {
        match self {
            Provider::Ready(client) => Some(client),
            Provider::Unavailable(_) => None,
        }
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        match self {
            Provider::Ready(_) => None,
            Provider::Unavailable(reason) => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_is_not_terminal() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(JobStatus::Pending.into_outcome().is_none());
    }

    #[test]
    fn test_terminal_states_convert_to_outcomes() {
        let succeeded = JobStatus::Succeeded {
            artifact_url: "https://cdn.example.com/a.png".to_string(),
        };
        assert!(succeeded.is_terminal());
        assert_eq!(
            succeeded.into_outcome(),
            Some(JobOutcome::Succeeded {
                artifact_url: "https://cdn.example.com/a.png".to_string()
            })
        );

        let failed = JobStatus::Failed {
            message: "content policy".to_string(),
        };
        assert_eq!(
            failed.into_outcome(),
            Some(JobOutcome::Failed {
                message: "content policy".to_string()
            })
        );
    }

    #[test]
    fn test_provider_availability_accessors() {
        let ready: Provider<u32> = Provider::Ready(7);
        assert_eq!(ready.as_ready(), Some(&7));
        assert!(ready.unavailable_reason().is_none());

        let missing: Provider<u32> = Provider::Unavailable("no credentials".to_string());
        assert!(missing.as_ready().is_none());
        assert_eq!(missing.unavailable_reason(), Some("no credentials"));
    }
}
