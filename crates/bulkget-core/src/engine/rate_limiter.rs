//! Global token bucket shared by every worker
//!
//! The bucket holds exactly one second of bandwidth. Workers take tokens
//! before writing bytes; a background clock resets the bucket to capacity
//! once per second with a single atomic store, so two refills can never
//! combine into more than one window of budget.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// How long a starved acquire sleeps before re-checking the bucket
const ACQUIRE_POLL: Duration = Duration::from_millis(25);

/// The refill clock period: one full bucket per second
const REFILL_INTERVAL: Duration = Duration::from_secs(1);

/// Byte budget shared across all workers, reset on a fixed clock
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

struct Inner {
    /// Bucket size: the bytes-per-second ceiling
    capacity: u64,
    /// Tokens left in the current window, always <= capacity
    available: AtomicU64,
}

impl RateLimiter {
    /// Create a limiter with a full bucket
    pub fn new(bytes_per_second: u64) -> Self {
        Self {
            inner: Arc::new(Inner {
                capacity: bytes_per_second,
                available: AtomicU64::new(bytes_per_second),
            }),
        }
    }

    /// The configured bytes-per-second ceiling
    pub fn capacity(&self) -> u64 {
        self.inner.capacity
    }

    /// Consume `amount` tokens before writing that many bytes.
    ///
    /// Takes whatever is available now and sleeps for the rest, so an
    /// amount larger than the bucket simply spans several refill windows.
    pub async fn acquire(&self, amount: u64) {
        let mut remaining = amount;
        while remaining > 0 {
            remaining -= self.take(remaining);
            if remaining > 0 {
                tokio::time::sleep(ACQUIRE_POLL).await;
            }
        }
    }

    /// Take up to `want` tokens, returning how many were actually taken
    fn take(&self, want: u64) -> u64 {
        let mut available = self.inner.available.load(Ordering::Acquire);
        loop {
            if available == 0 {
                return 0;
            }
            let taken = want.min(available);
            match self.inner.available.compare_exchange_weak(
                available,
                available - taken,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return taken,
                Err(actual) => available = actual,
            }
        }
    }

    /// Reset the bucket to full capacity in one atomic store
    pub fn refill(&self) {
        self.inner
            .available
            .store(self.inner.capacity, Ordering::Release);
    }

    /// Spawn the refill clock.
    ///
    /// Ticks once per second until the token is cancelled. The pool cancels
    /// it only after every worker has exited, so an acquire blocked on an
    /// empty bucket always sees another refill.
    pub fn spawn_refill(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(REFILL_INTERVAL);
            // Delay missed ticks instead of bursting them
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately and the bucket is already full
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => limiter.refill(),
                }
            }
            debug!("Refill clock stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::task::JoinSet;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn acquire_within_capacity_is_immediate() {
        let limiter = RateLimiter::new(1000);

        let start = Instant::now();
        limiter.acquire(600).await;
        limiter.acquire(400).await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_blocks_until_the_next_refill() {
        let limiter = RateLimiter::new(1000);
        let cancel = CancellationToken::new();
        let refill = limiter.spawn_refill(cancel.clone());

        limiter.acquire(1000).await;

        let start = Instant::now();
        limiter.acquire(1).await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(900), "granted too early: {elapsed:?}");
        assert!(elapsed <= Duration::from_millis(1100), "granted too late: {elapsed:?}");

        cancel.cancel();
        let _ = refill.await;
    }

    #[tokio::test(start_paused = true)]
    async fn refill_resets_to_capacity_not_beyond() {
        let limiter = RateLimiter::new(500);
        let cancel = CancellationToken::new();
        let refill = limiter.spawn_refill(cancel.clone());

        limiter.acquire(200).await;
        // Two refill windows pass; unspent budget must not accumulate
        tokio::time::sleep(Duration::from_millis(2500)).await;

        let start = Instant::now();
        limiter.acquire(500).await;
        assert!(start.elapsed() < Duration::from_millis(50));

        let start = Instant::now();
        limiter.acquire(1).await;
        assert!(start.elapsed() >= Duration::from_millis(400));

        cancel.cancel();
        let _ = refill.await;
    }

    #[tokio::test(start_paused = true)]
    async fn budget_is_shared_across_tasks() {
        let limiter = RateLimiter::new(1000);
        let cancel = CancellationToken::new();
        let refill = limiter.spawn_refill(cancel.clone());

        let start = Instant::now();
        let mut set = JoinSet::new();
        for _ in 0..4 {
            let limiter = limiter.clone();
            set.spawn(async move { limiter.acquire(500).await });
        }
        while set.join_next().await.is_some() {}

        // 2000 bytes against a 1000 B/s budget needs at least one refill
        assert!(start.elapsed() >= Duration::from_millis(900));

        cancel.cancel();
        let _ = refill.await;
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_acquire_spans_windows() {
        let limiter = RateLimiter::new(100);
        let cancel = CancellationToken::new();
        let refill = limiter.spawn_refill(cancel.clone());

        let start = Instant::now();
        limiter.acquire(250).await;
        // 100 now, 100 after one refill, 50 after the second
        assert!(start.elapsed() >= Duration::from_millis(1900));

        cancel.cancel();
        let _ = refill.await;
    }
}
