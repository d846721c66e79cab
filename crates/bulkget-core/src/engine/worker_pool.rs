//! Worker pool - N concurrent fetch loops over one shared queue
//!
//! The pool owns a run end to end: it starts the refill clock, spawns the
//! workers, waits for every one of them on a JoinSet barrier, then stops
//! the clock and reports totals. Per-task failures are counted, never
//! escalated.

use crate::config::Config;
use crate::engine::{Fetcher, RateLimiter, TaskQueue};
use crate::error::{ConfigError, TransferError};
use crate::events::FetchEvent;
use crate::manifest::DownloadTask;
use reqwest::Client;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Totals for one run, read once after every worker has exited
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Bytes moved over the network (fan-out copies not counted)
    pub bytes_transferred: u64,
    /// Wall time from just before the first worker to after the last
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_duration_ms")]
    pub elapsed: Duration,
    /// Tasks fully completed: primary written and every copy made
    pub completed: u64,
    /// Tasks that failed and were cleaned up
    pub failed: u64,
}

impl RunReport {
    /// Average network throughput in bytes per second
    pub fn throughput_bps(&self) -> u64 {
        let elapsed_ms = (self.elapsed.as_millis() as u64).max(1);
        self.bytes_transferred.saturating_mul(1000) / elapsed_ms
    }
}

fn serialize_duration_ms<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(value.as_millis() as u64)
}

/// Coordinator for one fetch run
pub struct WorkerPool {
    workers: usize,
    output_dir: PathBuf,
    queue: Arc<TaskQueue>,
    rate_limiter: RateLimiter,
    client: Client,
    transferred: Arc<AtomicU64>,
    event_tx: broadcast::Sender<FetchEvent>,
    cancel: CancellationToken,
}

impl WorkerPool {
    /// Build a pool for the given configuration and task list.
    ///
    /// Fails only when the HTTP client cannot be built; nothing has been
    /// fetched or written at that point.
    pub fn new(config: &Config, tasks: Vec<DownloadTask>) -> Result<Self, ConfigError> {
        // No overall timeout: a throttled transfer is legitimately slow
        let client = Client::builder()
            .user_agent(concat!("bulkget/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        let (event_tx, _) = broadcast::channel(1000);

        Ok(Self {
            workers: config.workers,
            output_dir: config.output_dir.clone(),
            queue: Arc::new(TaskQueue::new(tasks)),
            rate_limiter: RateLimiter::new(config.rate_limit),
            client,
            transferred: Arc::new(AtomicU64::new(0)),
            event_tx,
            cancel: CancellationToken::new(),
        })
    }

    /// Subscribe to progress events
    pub fn subscribe(&self) -> broadcast::Receiver<FetchEvent> {
        self.event_tx.subscribe()
    }

    /// Token that stops the run early when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the pool to completion and report totals.
    ///
    /// The refill clock keeps ticking until after the barrier, so a worker
    /// blocked on the limiter always makes progress; it is stopped and
    /// awaited once every worker has exited.
    pub async fn run(self) -> RunReport {
        let refill_cancel = self.cancel.child_token();
        let refill_handle = self.rate_limiter.spawn_refill(refill_cancel.clone());

        info!(
            "Starting {} workers for {} tasks ({} B/s limit)",
            self.workers,
            self.queue.len(),
            self.rate_limiter.capacity()
        );

        let started = Instant::now();
        let mut join_set = JoinSet::new();

        for worker_id in 0..self.workers {
            let queue = Arc::clone(&self.queue);
            let cancel = self.cancel.clone();
            let fetcher = Fetcher::new(
                self.client.clone(),
                self.rate_limiter.clone(),
                self.output_dir.clone(),
                Arc::clone(&self.transferred),
                self.event_tx.clone(),
                self.cancel.clone(),
            );

            join_set.spawn(async move {
                let mut completed = 0u64;
                let mut failed = 0u64;

                while let Some(task) = queue.take() {
                    if cancel.is_cancelled() {
                        break;
                    }
                    match fetcher.fetch(&task).await {
                        Ok(_) => completed += 1,
                        Err(TransferError::Cancelled) => {
                            warn!("Worker {} stopping: run cancelled", worker_id);
                            failed += 1;
                            break;
                        }
                        Err(e) => {
                            error!("Worker {} failed to fetch {}: {}", worker_id, task.url, e);
                            failed += 1;
                        }
                    }
                }

                (completed, failed)
            });
        }

        // The barrier: every worker must exit before totals are read
        let mut completed = 0u64;
        let mut failed = 0u64;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((done, lost)) => {
                    completed += done;
                    failed += lost;
                }
                Err(e) => error!("Worker panicked: {}", e),
            }
        }

        let elapsed = started.elapsed();

        refill_cancel.cancel();
        let _ = refill_handle.await;

        RunReport {
            bytes_transferred: self.transferred.load(Ordering::Acquire),
            elapsed,
            completed,
            failed,
        }
    }
}
