//! Error types for the bulkget core

use std::path::PathBuf;
use thiserror::Error;

/// Fatal setup problems, detected before any network activity
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unrecognized size: {0}")]
    InvalidSize(String),

    #[error("Worker count must be at least 1")]
    ZeroWorkers,

    #[error("Rate limit must be at least 1 byte per second")]
    ZeroRateLimit,

    #[error("Output directory {} does not exist or is not a directory", .0.display())]
    OutputDir(PathBuf),

    #[error("Cannot read manifest {}: {}", .path.display(), .source)]
    ManifestRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Errors local to a single transfer task. The worker loop logs these,
/// counts them, and moves on to the next task.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transfer was cancelled")]
    Cancelled,
}
