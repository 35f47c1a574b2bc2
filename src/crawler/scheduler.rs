//! Scheduling of crawl work
//!
//! This module handles:
//! - The shared queue of seed tasks, one per accepted domain
//! - The run-wide page budget, reserved at dispatch time
//! - Per-domain frontiers with the per-domain page budget and a seen set
//!
//! A domain's frontier is owned by the single worker crawling that domain,
//! so only the seed queue and the page budget are shared between workers.

use crate::config::CrawlerConfig;
use crate::state::{CrawlTask, DomainState};
use crate::url::{extract_domain, normalize_url, seed_url};
use crate::{ConfigError, UrlError};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, trace};
use url::Url;

/// Queue of seed tasks shared by all domain workers
#[derive(Debug)]
pub struct Scheduler {
    seeds: Mutex<VecDeque<CrawlTask>>,
    /// Pages dispatched across all domains
    dispatched: AtomicU32,
    max_total_pages: u32,
}

impl Scheduler {
    /// Creates a scheduler from raw seed strings
    ///
    /// Seeds may be bare domains or URLs. Seeds resolving to a domain that
    /// was already accepted are dropped.
    ///
    /// # Returns
    ///
    /// * `Ok(Scheduler)` - Every seed was parsed
    /// * `Err(ConfigError::InvalidSeed)` - A seed is not a usable domain or URL
    pub fn new(config: &CrawlerConfig, seeds: &[String]) -> Result<Self, ConfigError> {
        let mut queue = VecDeque::new();
        let mut domains = HashSet::new();

        for raw in seeds {
            let invalid = |e: UrlError| ConfigError::InvalidSeed(format!("'{}': {}", raw, e));
            let url = seed_url(raw).map_err(invalid)?;
            let domain = extract_domain(&url)
                .ok_or(UrlError::MissingDomain)
                .map_err(invalid)?;

            if domains.insert(domain.clone()) {
                queue.push_back(CrawlTask::new(domain, url));
            } else {
                debug!("Skipping duplicate seed {} ({})", raw, domain);
            }
        }

        Ok(Self {
            seeds: Mutex::new(queue),
            dispatched: AtomicU32::new(0),
            max_total_pages: config.max_total_pages,
        })
    }

    /// Takes the seed task of the next domain to crawl
    pub fn next_seed(&self) -> Option<CrawlTask> {
        self.seeds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    /// Number of domains not yet handed to a worker
    pub fn pending_domains(&self) -> usize {
        self.seeds.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Reserves one page of the run-wide budget
    ///
    /// Returns false once `max_total_pages` pages have been dispatched.
    pub fn try_reserve_page(&self) -> bool {
        self.dispatched
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.max_total_pages).then_some(n + 1)
            })
            .is_ok()
    }

    /// Pages dispatched so far
    pub fn dispatched(&self) -> u32 {
        self.dispatched.load(Ordering::SeqCst)
    }
}

/// Pending pages of one domain
#[derive(Debug)]
pub struct DomainFrontier {
    domain: String,
    config: CrawlerConfig,
    /// Page budget and politeness timing
    pub state: DomainState,
    pending: VecDeque<CrawlTask>,
    seen: HashSet<String>,
}

impl DomainFrontier {
    /// Creates the frontier of a domain from its seed task
    ///
    /// The seed page is queued first, followed by the configured common
    /// paths resolved against it.
    pub fn new(seed: CrawlTask, config: &CrawlerConfig) -> Self {
        let mut frontier = Self {
            domain: seed.domain.clone(),
            config: config.clone(),
            state: DomainState::new(),
            pending: VecDeque::new(),
            seen: HashSet::new(),
        };

        let base = seed.url.clone();
        frontier.push_task(seed);
        for path in &config.common_paths {
            let joined = base
                .join(path)
                .map_err(|e| UrlError::Parse(e.to_string()))
                .and_then(|u| normalize_url(u.as_str()));
            match joined {
                Ok(url) => {
                    frontier.push(url);
                }
                Err(e) => trace!("Skipping common path {}: {}", path, e),
            }
        }
        frontier
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Queues a page unless it was seen before or the domain budget is used up
    pub fn push(&mut self, url: Url) -> bool {
        let task = CrawlTask::new(self.domain.clone(), url);
        self.push_task(task)
    }

    fn push_task(&mut self, task: CrawlTask) -> bool {
        if self.seen.contains(task.url.as_str()) {
            return false;
        }
        if !self.state.admit_page(&self.config) {
            trace!("Page budget of {} used, dropping {}", self.domain, task.url);
            return false;
        }

        self.seen.insert(task.url.to_string());
        self.pending.push_back(task);
        true
    }

    pub fn pop(&mut self) -> Option<CrawlTask> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
