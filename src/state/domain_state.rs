use crate::config::CrawlerConfig;
use std::time::{Duration, Instant};

/// Page budget and politeness timing of one domain
///
/// Owned by the worker crawling the domain, so it needs no locking.
#[derive(Debug, Clone, Default)]
pub struct DomainState {
    /// Pages admitted to the domain's frontier; retries are not counted
    pub pages_admitted: u32,

    pub last_request_time: Option<Instant>,

    /// Set after an HTTP 429; doubles the politeness delay
    pub rate_limited: bool,
}

impl DomainState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes one page from the budget, returning false once it is used up
    pub fn admit_page(&mut self, config: &CrawlerConfig) -> bool {
        if self.pages_admitted >= config.max_pages_per_domain {
            return false;
        }
        self.pages_admitted += 1;
        true
    }

    pub fn record_request(&mut self, now: Instant) {
        self.last_request_time = Some(now);
    }

    pub fn mark_rate_limited(&mut self) {
        self.rate_limited = true;
    }

    /// Wait left before the next request may be sent, None if it may go now
    pub fn time_until_next_request(
        &self,
        config: &CrawlerConfig,
        now: Instant,
    ) -> Option<Duration> {
        let last = self.last_request_time?;
        let mut min_delay = Duration::from_millis(config.politeness_delay_ms);
        if self.rate_limited {
            min_delay *= 2;
        }

        let elapsed = now.saturating_duration_since(last);
        min_delay
            .checked_sub(elapsed)
            .filter(|wait| !wait.is_zero())
    }
}
