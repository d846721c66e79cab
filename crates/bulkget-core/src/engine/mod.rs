//! Fetch engine - shared queue, global throttle, worker pool
//!
//! The engine wires four pieces together:
//! - A task queue drained exactly once across all workers
//! - A token bucket reset to capacity on a fixed one second clock
//! - A fetcher that streams one URL to disk and fans out local copies
//! - A worker pool that runs N fetch loops and reports run totals

mod fetcher;
mod rate_limiter;
mod task_queue;
mod worker_pool;

pub use fetcher::*;
pub use rate_limiter::*;
pub use task_queue::*;
pub use worker_pool::*;
