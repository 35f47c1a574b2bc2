//! Crawler module for page fetching and crawl coordination
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with size and time limits
//! - HTML parsing into links and scannable text segments
//! - Seed scheduling and page budgets
//! - Overall crawl coordination and cancellation

mod coordinator;
mod fetcher;
mod parser;
mod scheduler;

pub use coordinator::{retry_delay, Coordinator, RunHandle};
pub use fetcher::{build_http_client, FetchError, Fetcher};
pub use parser::{parse_html, ParsedPage, Segment};
pub use scheduler::{DomainFrontier, Scheduler};
