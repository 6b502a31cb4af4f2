//! Artifact download to local storage.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{FetchError, FetchResult};

/// Downloads remote artifacts to local files.
///
/// A partial download is never visible at the destination: bytes stream to
/// a `.part` sibling which is renamed into place only after a complete,
/// non-empty body. On any failure the `.part` file is removed and the
/// destination is untouched.
#[derive(Debug, Clone)]
pub struct ArtifactFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl ArtifactFetcher {
    /// Create a fetcher with the given whole-download timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    /// Download timeout from `DOWNLOAD_TIMEOUT` (seconds, default 60).
    pub fn from_env() -> Self {
        let secs: u64 = std::env::var("DOWNLOAD_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        Self::new(Duration::from_secs(secs))
    }

    /// Download `url` to `destination`, creating parent directories.
    ///
    /// A repeat fetch to the same destination overwrites it. An empty body
    /// is an error, not a success.
    pub async fn fetch(&self, url: &str, destination: &Path) -> FetchResult<PathBuf> {
        if let Some(parent) = destination.parent() {
            if !parent.exists() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let part = part_path(destination);
        match self.download_to(url, &part).await {
            Ok(bytes) => {
                tokio::fs::rename(&part, destination).await.map_err(|e| {
                    let _ = std::fs::remove_file(&part);
                    FetchError::from(e)
                })?;
                debug!(url = %url, path = %destination.display(), bytes, "Artifact downloaded");
                Ok(destination.to_path_buf())
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&part).await;
                Err(e)
            }
        }
    }

    async fn download_to(&self, url: &str, part: &Path) -> FetchResult<u64> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let mut file = tokio::fs::File::create(part).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        if written == 0 {
            return Err(FetchError::EmptyArtifact(url.to_string()));
        }
        Ok(written)
    }
}

/// `dst` with a `.part` suffix appended to the full file name.
fn part_path(dst: &Path) -> PathBuf {
    let mut name = dst.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}
