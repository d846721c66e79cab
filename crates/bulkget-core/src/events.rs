//! Progress events broadcast to subscribers during a run
//!
//! Events are fire-and-forget: the engine never blocks on a slow or absent
//! subscriber. Each task announces itself before any bytes move, then
//! reports exactly one terminal event.

/// Lifecycle events for individual tasks
#[derive(Debug, Clone)]
pub enum FetchEvent {
    /// A worker picked up a task and is about to transfer it
    TaskStarted { url: String, destination: String },

    /// The primary file was written and every copy was made
    TaskCompleted {
        url: String,
        destination: String,
        /// Bytes moved over the network for this task
        bytes: u64,
        /// Local copies fanned out after the transfer
        copies: usize,
    },

    /// The task failed; any partial files were removed
    TaskFailed {
        url: String,
        destination: String,
        error: String,
    },
}
