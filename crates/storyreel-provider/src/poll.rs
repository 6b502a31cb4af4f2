//! Bounded fixed-interval polling until a remote task reaches a terminal state.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::PollError;
use crate::job::{JobClient, JobHandle, JobOutcome};

/// Polling bounds for one task.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Total wall-clock bound for the whole sequence
    pub max_wait: Duration,
    /// Fixed gap between polls
    pub interval: Duration,
    /// Consecutive transport errors tolerated before giving up
    pub transport_error_budget: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_secs(300),
            interval: Duration::from_secs(5),
            transport_error_budget: 5,
        }
    }
}

impl PollConfig {
    pub fn new(max_wait: Duration, interval: Duration) -> Self {
        Self {
            max_wait,
            interval,
            ..Default::default()
        }
    }
}

/// Drive `handle` through `client.poll` until a terminal state.
///
/// The cadence is a fixed interval, not exponential backoff: generation
/// jobs have multi-second latency floors, so a fixed gap gives a
/// predictable worst-case bound. A terminal status returns immediately.
///
/// A transport error on one poll is noise, not a job failure: it is logged
/// and the loop keeps waiting, but `transport_error_budget` consecutive
/// errors end the sequence with `TransportExhausted`. Any successful poll
/// resets the consecutive count. Sleeps after errors still count against
/// `max_wait`.
pub async fn await_completion<C>(
    client: &C,
    handle: &JobHandle,
    config: &PollConfig,
) -> Result<JobOutcome, PollError>
where
    C: JobClient + ?Sized,
{
    let started = Instant::now();
    let mut consecutive_errors: u32 = 0;

    loop {
        match client.poll(handle).await {
            Ok(status) => {
                consecutive_errors = 0;
                if let Some(outcome) = status.into_outcome() {
                    return Ok(outcome);
                }
                debug!(task_id = %handle, "Task still pending");
            }
            Err(e) => {
                consecutive_errors += 1;
                if consecutive_errors >= config.transport_error_budget {
                    return Err(PollError::TransportExhausted {
                        attempts: consecutive_errors,
                        last_error: e,
                    });
                }
                warn!(
                    task_id = %handle,
                    consecutive = consecutive_errors,
                    "Poll attempt failed, continuing: {}",
                    e
                );
            }
        }

        tokio::time::sleep(config.interval).await;
        if started.elapsed() >= config.max_wait {
            return Err(PollError::Timeout(config.max_wait));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProviderError, ProviderResult};
    use crate::job::JobStatus;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use storyreel_models::WorkItem;

    /// Replays a fixed script of poll responses; pending once exhausted.
    struct ScriptedClient {
        responses: Mutex<VecDeque<ProviderResult<JobStatus>>>,
        polls: AtomicU32,
    }

    impl ScriptedClient {
        fn new(responses: Vec<ProviderResult<JobStatus>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                polls: AtomicU32::new(0),
            }
        }

        fn poll_count(&self) -> u32 {
            self.polls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl JobClient for ScriptedClient {
        async fn submit(&self, _item: &WorkItem) -> ProviderResult<JobHandle> {
            Ok(JobHandle::new("task-1"))
        }

        async fn poll(&self, _handle: &JobHandle) -> ProviderResult<JobStatus> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(JobStatus::Pending))
        }
    }

    fn transport_error() -> ProviderError {
        ProviderError::invalid_response("connection reset")
    }

    fn succeeded() -> ProviderResult<JobStatus> {
        Ok(JobStatus::Succeeded {
            artifact_url: "https://cdn.example.com/a.png".to_string(),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeded_returns_on_first_poll() {
        let client = ScriptedClient::new(vec![succeeded()]);
        let outcome = await_completion(&client, &JobHandle::new("t"), &PollConfig::default())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            JobOutcome::Succeeded {
                artifact_url: "https://cdn.example.com/a.png".to_string()
            }
        );
        assert_eq!(client.poll_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_returns_immediately_without_retry() {
        let client = ScriptedClient::new(vec![Ok(JobStatus::Failed {
            message: "content policy".to_string(),
        })]);
        let outcome = await_completion(&client, &JobHandle::new("t"), &PollConfig::default())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            JobOutcome::Failed {
                message: "content policy".to_string()
            }
        );
        assert_eq!(client.poll_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_after_exactly_two_polls() {
        // max_wait 10s, interval 5s: polls at t=0 and t=5, timeout at t=10
        let client = ScriptedClient::new(Vec::new());
        let config = PollConfig::new(Duration::from_secs(10), Duration::from_secs(5));

        let err = await_completion(&client, &JobHandle::new("t"), &config)
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::Timeout(d) if d == Duration::from_secs(10)));
        assert_eq!(client.poll_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_transport_errors_exhaust_budget() {
        let client = ScriptedClient::new(
            (0..5).map(|_| Err(transport_error())).collect(),
        );
        let config = PollConfig {
            max_wait: Duration::from_secs(300),
            interval: Duration::from_secs(5),
            transport_error_budget: 5,
        };

        let err = await_completion(&client, &JobHandle::new("t"), &config)
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::TransportExhausted { attempts: 5, .. }));
        assert_eq!(client.poll_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_poll_resets_error_budget() {
        let mut responses: Vec<ProviderResult<JobStatus>> =
            (0..4).map(|_| Err(transport_error())).collect();
        responses.push(Ok(JobStatus::Pending));
        responses.extend((0..4).map(|_| Err(transport_error())));
        responses.push(succeeded());

        let client = ScriptedClient::new(responses);
        let outcome = await_completion(&client, &JobHandle::new("t"), &PollConfig::default())
            .await
            .unwrap();

        assert!(matches!(outcome, JobOutcome::Succeeded { .. }));
        assert_eq!(client.poll_count(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_sleeps_count_against_max_wait() {
        let client = ScriptedClient::new(
            (0..10).map(|_| Err(transport_error())).collect(),
        );
        let config = PollConfig {
            max_wait: Duration::from_secs(10),
            interval: Duration::from_secs(5),
            transport_error_budget: 100,
        };

        let err = await_completion(&client, &JobHandle::new("t"), &config)
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::Timeout(_)));
        assert_eq!(client.poll_count(), 2);
    }
}
