//! Bulkget Core - Concurrent bulk fetch engine
//!
//! This crate takes a manifest of (URL, filename) pairs and moves the lot:
//! each distinct URL is fetched exactly once by a bounded pool of workers
//! sharing one global bandwidth budget, then fanned out to every filename
//! that listed it. When every task has settled it reports total bytes and
//! wall time.

mod config;
mod engine;
mod error;
mod events;
mod manifest;

pub use config::*;
pub use engine::*;
pub use error::*;
pub use events::*;
pub use manifest::*;
