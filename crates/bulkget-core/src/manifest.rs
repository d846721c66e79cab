//! Manifest parsing - the list of (URL, filename) pairs to fetch
//!
//! One entry per line: `<url> <filename>`. Entries sharing a URL merge into
//! a single task that fans out to every listed filename, so each URL is
//! fetched from the network at most once. Lines that cannot be used are
//! skipped with a warning; one bad entry never aborts a run.

use crate::error::ConfigError;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// One unit of work: a source URL and every filename it should end up as
#[derive(Debug, Clone)]
pub struct DownloadTask {
    /// Source URL, fetched exactly once
    pub url: String,
    // Seeded by `new` and only ever appended to, so never empty;
    // `primary()` relies on this.
    destinations: Vec<String>,
}

impl DownloadTask {
    /// Create a task with its primary destination
    pub fn new(url: impl Into<String>, primary: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            destinations: vec![primary.into()],
        }
    }

    /// Add another destination filename
    pub fn add_destination(&mut self, name: impl Into<String>) {
        self.destinations.push(name.into());
    }

    /// The destination written directly from the network
    pub fn primary(&self) -> &str {
        &self.destinations[0]
    }

    /// Destinations filled by copying the primary after it completes
    pub fn fan_out(&self) -> &[String] {
        &self.destinations[1..]
    }

    /// Every destination filename, primary first
    pub fn destinations(&self) -> &[String] {
        &self.destinations
    }
}

/// A parsed manifest: distinct tasks in first-seen URL order
#[derive(Debug, Default)]
pub struct Manifest {
    tasks: Vec<DownloadTask>,
}

impl Manifest {
    /// Read and parse a manifest file
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|source| {
            ConfigError::ManifestRead {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Ok(Self::parse(&contents))
    }

    /// Parse manifest text. Never fails: offending lines are skipped with
    /// a warning naming the 1-based line number.
    pub fn parse(input: &str) -> Self {
        let mut tasks: Vec<DownloadTask> = Vec::new();
        let mut task_by_url: HashMap<String, usize> = HashMap::new();
        // filename -> the URL it was first bound to
        let mut claimed: HashMap<String, String> = HashMap::new();

        for (index, raw) in input.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            let mut fields = line.split_whitespace();
            let (url, filename) = match (fields.next(), fields.next(), fields.next()) {
                (Some(url), Some(filename), None) => (url, filename),
                _ => {
                    warn!("Line {}: expected '<url> <filename>', skipping", line_no);
                    continue;
                }
            };

            if let Err(e) = url::Url::parse(url) {
                warn!("Line {}: invalid URL {}: {}, skipping", line_no, url, e);
                continue;
            }

            match claimed.get(filename) {
                Some(bound) if bound == url => {
                    debug!("Line {}: duplicate entry for {}, ignoring", line_no, filename);
                    continue;
                }
                Some(bound) => {
                    warn!(
                        "Line {}: {} is already fetched from {}, skipping",
                        line_no, filename, bound
                    );
                    continue;
                }
                None => {}
            }

            match task_by_url.get(url) {
                Some(&i) => tasks[i].add_destination(filename),
                None => {
                    task_by_url.insert(url.to_string(), tasks.len());
                    tasks.push(DownloadTask::new(url, filename));
                }
            }
            claimed.insert(filename.to_string(), url.to_string());
        }

        Self { tasks }
    }

    /// The parsed tasks in first-seen URL order
    pub fn tasks(&self) -> &[DownloadTask] {
        &self.tasks
    }

    /// Consume the manifest, yielding its tasks
    pub fn into_tasks(self) -> Vec<DownloadTask> {
        self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
