//! Batch execution of work items against one provider.

use std::path::PathBuf;

use tracing::{error, info, warn};

use storyreel_models::{ItemResult, WorkItem};
use storyreel_provider::{
    await_completion, with_retry, ArtifactFetcher, JobClient, JobOutcome, PollConfig, Provider,
    RetryConfig,
};

/// Drives every work item of a stage through submit, poll and download.
///
/// Items run strictly in input order, one at a time; results come back in
/// the same order. A failed item never stops the batch. An unavailable
/// provider fails the whole batch up front with its reason and makes no
/// remote call at all.
pub struct StageRunner<C> {
    provider: Provider<C>,
    fetcher: ArtifactFetcher,
    retry: RetryConfig,
    poll: PollConfig,
    output_dir: PathBuf,
    extension: String,
    source_required_reason: Option<String>,
}

impl<C: JobClient> StageRunner<C> {
    pub fn new(
        provider: Provider<C>,
        fetcher: ArtifactFetcher,
        retry: RetryConfig,
        poll: PollConfig,
        output_dir: impl Into<PathBuf>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            fetcher,
            retry,
            poll,
            output_dir: output_dir.into(),
            extension: extension.into(),
            source_required_reason: None,
        }
    }

    /// Skip items that carry no source artifact, recording `reason`.
    /// Skipped items never reach the provider.
    pub fn require_source_artifact(mut self, reason: impl Into<String>) -> Self {
        self.source_required_reason = Some(reason.into());
        self
    }

    /// Run the whole batch; one result per item, in input order.
    pub async fn run_batch(&self, items: &[WorkItem]) -> Vec<ItemResult> {
        let client = match &self.provider {
            Provider::Ready(client) => client,
            Provider::Unavailable(reason) => {
                error!(reason = %reason, "Provider unavailable, failing all items");
                return items
                    .iter()
                    .map(|item| ItemResult::failed(item.clone(), reason.clone()))
                    .collect();
            }
        };

        let mut results = Vec::with_capacity(items.len());
        for item in items {
            results.push(self.process_item(client, item).await);
        }
        results
    }

    async fn process_item(&self, client: &C, item: &WorkItem) -> ItemResult {
        if let Some(reason) = &self.source_required_reason {
            if item.source_artifact_path.is_none() {
                info!(item_id = %item.item_id, "No source artifact, skipping item");
                return ItemResult::skipped(item.clone(), reason.clone());
            }
        }

        let handle = match with_retry(&self.retry, "submit", || client.submit(item)).await {
            Ok(handle) => handle,
            Err(e) => {
                warn!(item_id = %item.item_id, error = %e, "Submission failed");
                return ItemResult::failed(item.clone(), format!("submit failed: {}", e));
            }
        };

        let outcome = match await_completion(client, &handle, &self.poll).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(item_id = %item.item_id, task_id = %handle, error = %e, "Polling gave up");
                return ItemResult::failed(item.clone(), e.to_string());
            }
        };

        match outcome {
            JobOutcome::Succeeded { artifact_url } => {
                let destination = self.artifact_path(item);
                match self.fetcher.fetch(&artifact_url, &destination).await {
                    Ok(path) => {
                        info!(item_id = %item.item_id, path = %path.display(), "Item completed");
                        ItemResult::success(item.clone(), path.display().to_string())
                    }
                    Err(e) => {
                        warn!(item_id = %item.item_id, error = %e, "Artifact download failed");
                        ItemResult::failed(item.clone(), format!("download failed: {}", e))
                    }
                }
            }
            JobOutcome::Failed { message } => {
                warn!(item_id = %item.item_id, reason = %message, "Task failed remotely");
                ItemResult::failed(item.clone(), message)
            }
        }
    }

    fn artifact_path(&self, item: &WorkItem) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", item.item_id, self.extension))
    }
}
