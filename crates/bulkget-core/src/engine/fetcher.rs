//! Fetcher - streams one task's URL to disk and fans out local copies
//!
//! One attempt per task, no retries. Every chunk passes through the shared
//! rate limiter before it is written. On any failure the partial primary
//! and any copies already made are removed, so a failed task leaves no
//! files behind.

use crate::engine::RateLimiter;
use crate::error::TransferError;
use crate::events::FetchEvent;
use crate::manifest::DownloadTask;
use futures::StreamExt;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Per-task fetch logic over the run's shared handles
#[derive(Clone)]
pub struct Fetcher {
    /// Shared HTTP client
    client: Client,
    /// Global byte budget
    rate_limiter: RateLimiter,
    /// Directory destination files are written into
    output_dir: PathBuf,
    /// Run-wide network byte counter
    transferred: Arc<AtomicU64>,
    /// Event broadcaster
    event_tx: broadcast::Sender<FetchEvent>,
    /// External stop signal
    cancel: CancellationToken,
}

impl Fetcher {
    /// Create a fetcher over the run's shared handles
    pub fn new(
        client: Client,
        rate_limiter: RateLimiter,
        output_dir: PathBuf,
        transferred: Arc<AtomicU64>,
        event_tx: broadcast::Sender<FetchEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            rate_limiter,
            output_dir,
            transferred,
            event_tx,
            cancel,
        }
    }

    /// Fetch one task: stream its URL to the primary destination, then copy
    /// the primary to every remaining destination. Returns the network
    /// bytes moved for this task.
    pub async fn fetch(&self, task: &DownloadTask) -> Result<u64, TransferError> {
        let primary = task.primary();

        let _ = self.event_tx.send(FetchEvent::TaskStarted {
            url: task.url.clone(),
            destination: primary.to_string(),
        });

        match self.transfer(task).await {
            Ok(bytes) => {
                info!(
                    "Completed {} ({} bytes, {} copies)",
                    primary,
                    bytes,
                    task.fan_out().len()
                );
                let _ = self.event_tx.send(FetchEvent::TaskCompleted {
                    url: task.url.clone(),
                    destination: primary.to_string(),
                    bytes,
                    copies: task.fan_out().len(),
                });
                Ok(bytes)
            }
            Err(e) => {
                self.cleanup(task).await;
                let _ = self.event_tx.send(FetchEvent::TaskFailed {
                    url: task.url.clone(),
                    destination: primary.to_string(),
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Run the network transfer and the fan-out copies for one task
    async fn transfer(&self, task: &DownloadTask) -> Result<u64, TransferError> {
        let response = self
            .client
            .get(&task.url)
            .send()
            .await?
            .error_for_status()?;

        let primary_path = self.output_dir.join(task.primary());
        let mut file = File::create(&primary_path).await?;
        let mut stream = response.bytes_stream();
        let mut bytes = 0u64;

        loop {
            let chunk = tokio::select! {
                _ = self.cancel.cancelled() => return Err(TransferError::Cancelled),
                next = stream.next() => match next {
                    Some(chunk) => chunk?,
                    None => break,
                },
            };
            let chunk_len = chunk.len() as u64;

            // Every byte consumes shared budget before it is written
            tokio::select! {
                _ = self.cancel.cancelled() => return Err(TransferError::Cancelled),
                _ = self.rate_limiter.acquire(chunk_len) => {}
            }

            file.write_all(&chunk).await?;
            bytes += chunk_len;
            self.transferred.fetch_add(chunk_len, Ordering::AcqRel);
        }

        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        self.fan_out(task, &primary_path).await?;

        Ok(bytes)
    }

    /// Copy the completed primary to every remaining destination.
    /// Plain local copies: not rate limited, not counted as transferred.
    async fn fan_out(&self, task: &DownloadTask, primary_path: &Path) -> Result<(), TransferError> {
        for name in task.fan_out() {
            if name == task.primary() {
                continue;
            }
            let copy_path = self.output_dir.join(name);
            tokio::fs::copy(primary_path, &copy_path).await?;
            debug!("Copied {} -> {}", task.primary(), name);
        }
        Ok(())
    }

    /// Remove every file this task may have produced, best effort
    async fn cleanup(&self, task: &DownloadTask) {
        for name in task.destinations() {
            let path = self.output_dir.join(name);
            if tokio::fs::remove_file(&path).await.is_ok() {
                debug!("Removed partial file {}", name);
            }
        }
    }
}
