//! Output handler traits and types
//!
//! This module defines the trait interface for result writers and the run
//! metadata they receive alongside the snapshot.

use crate::pipeline::RunSnapshot;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for OutputError {
    fn from(e: serde_json::Error) -> Self {
        OutputError::Format(e.to_string())
    }
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Metadata of a finished (or cancelled) run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub config_hash: String,
    pub seeds: Vec<String>,
    /// True when the run was stopped before the crawl drained
    pub cancelled: bool,
    pub pages_failed: u64,
}

impl RunSummary {
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds().max(0)
    }

    pub fn status(&self) -> &'static str {
        if self.cancelled {
            "cancelled"
        } else {
            "completed"
        }
    }
}

/// Trait for writers of run results
pub trait OutputHandler {
    /// Short name used in log lines
    fn name(&self) -> &'static str;

    /// Writes the results of a run
    ///
    /// # Arguments
    ///
    /// * `summary` - Run metadata
    /// * `snapshot` - Records and statistics at the end of the run
    fn write(&self, summary: &RunSummary, snapshot: &RunSnapshot) -> OutputResult<()>;
}
