//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `TaskState` / `CrawlTask`: the per-page state machine (queued, fetching, retrying, parsed, failed)
//! - `DomainState`: per-domain page budget and politeness timing

mod domain_state;
mod task_state;

// Re-export main types
pub use domain_state::DomainState;
pub use task_state::{CrawlTask, TaskState};
