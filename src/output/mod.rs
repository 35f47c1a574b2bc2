//! Output module for run statistics and result export
//!
//! This module handles:
//! - Aggregating run statistics from pipeline events
//! - Exporting the result set as CSV and JSON
//! - Generating markdown summaries of a run

mod export;
mod markdown;
pub mod stats;
mod traits;

pub use export::{format_csv, CsvOutputHandler, JsonOutputHandler};
pub use markdown::{format_markdown_summary, MarkdownOutputHandler};
pub use stats::{print_statistics, SearchStats, StatsAggregator, StatsEvent};
pub use traits::{OutputError, OutputHandler, OutputResult, RunSummary};

use crate::config::OutputConfig;
use tracing::info;

/// CSV and markdown handlers, plus JSON when a path is configured
pub fn handlers_for(config: &OutputConfig) -> Vec<Box<dyn OutputHandler>> {
    let mut handlers: Vec<Box<dyn OutputHandler>> = vec![
        Box::new(CsvOutputHandler::new(&config.results_path)),
        Box::new(MarkdownOutputHandler::new(&config.summary_path)),
    ];
    if let Some(path) = &config.json_path {
        handlers.push(Box::new(JsonOutputHandler::new(path)));
    }
    handlers
}

/// Runs every handler, stopping at the first failure
pub fn write_all(
    handlers: &[Box<dyn OutputHandler>],
    summary: &RunSummary,
    snapshot: &crate::pipeline::RunSnapshot,
) -> OutputResult<()> {
    for handler in handlers {
        handler.write(summary, snapshot)?;
        info!("Wrote {} output", handler.name());
    }
    Ok(())
}
