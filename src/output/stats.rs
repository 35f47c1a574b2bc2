//! Run statistics
//!
//! Workers never touch counters directly: they send discrete `StatsEvent`s
//! to the `StatsAggregator`, which applies each one under a single lock.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Aggregate counts of one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStats {
    pub total_found: u64,
    pub valid_emails: u64,
    pub invalid_emails: u64,
    pub domains_scanned: u64,
    pub pages_scanned: u64,
}

impl SearchStats {
    /// Share of found addresses that are valid, in percent
    pub fn valid_rate(&self) -> f64 {
        if self.total_found == 0 {
            0.0
        } else {
            (self.valid_emails as f64 / self.total_found as f64) * 100.0
        }
    }
}

/// One update from the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsEvent {
    /// First task of a domain was dequeued
    DomainStarted,
    /// A crawl task reached a terminal state
    PageFinished { failed: bool },
    /// A new address entered the result set
    RecordCreated { valid: bool },
    /// An existing invalid record became valid through a later sighting
    RecordRevalidated,
}

#[derive(Debug, Default)]
struct Counters {
    stats: SearchStats,
    pages_failed: u64,
}

/// Accumulates run statistics from pipeline events
#[derive(Debug, Default)]
pub struct StatsAggregator {
    counters: Mutex<Counters>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies one event atomically
    pub fn record(&self, event: StatsEvent) {
        let mut counters = self.lock();
        match event {
            StatsEvent::DomainStarted => counters.stats.domains_scanned += 1,
            StatsEvent::PageFinished { failed } => {
                counters.stats.pages_scanned += 1;
                if failed {
                    counters.pages_failed += 1;
                }
            }
            StatsEvent::RecordCreated { valid } => {
                counters.stats.total_found += 1;
                if valid {
                    counters.stats.valid_emails += 1;
                } else {
                    counters.stats.invalid_emails += 1;
                }
            }
            StatsEvent::RecordRevalidated => {
                if counters.stats.invalid_emails > 0 {
                    counters.stats.invalid_emails -= 1;
                    counters.stats.valid_emails += 1;
                }
            }
        }
    }

    /// Point-in-time copy reflecting every event recorded before the call
    pub fn snapshot(&self) -> SearchStats {
        self.lock().stats
    }

    /// Pages that ended in permanent failure
    pub fn pages_failed(&self) -> u64 {
        self.lock().pages_failed
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &SearchStats) {
    println!("=== Run Statistics ===\n");

    println!("Overview:");
    println!("  Domains scanned: {}", stats.domains_scanned);
    println!("  Pages scanned: {}", stats.pages_scanned);
    println!();

    println!("Addresses:");
    println!("  Total found: {}", stats.total_found);
    println!("  Valid: {}", stats.valid_emails);
    println!("  Invalid: {}", stats.invalid_emails);
    println!();

    println!(
        "Valid Rate: {:.1}% ({} / {} addresses)",
        stats.valid_rate(),
        stats.valid_emails,
        stats.total_found
    );
}
