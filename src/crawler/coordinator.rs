//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that coordinates:
//! - Handing seed domains to workers, up to the domain concurrency cap
//! - Serialized, polite fetching within each domain
//! - Retries with exponential backoff for transient fetch failures
//! - Feeding fetched pages through the pipeline and following matching links
//! - Run cancellation

use crate::config::{validate, Config};
use crate::crawler::fetcher::{FetchError, Fetcher};
use crate::crawler::scheduler::{DomainFrontier, Scheduler};
use crate::extract::scan_page;
use crate::output::StatsEvent;
use crate::pipeline::{Pipeline, RunSnapshot};
use crate::state::{CrawlTask, DomainState, TaskState};
use crate::url::discover_links;
use crate::DovepeakError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

/// Backoff before the retry following `attempt`: base * 2^(attempt - 1)
pub fn retry_delay(base_ms: u64, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    Duration::from_millis(base_ms.saturating_mul(1u64 << exponent))
}

/// How a crawl task ended
#[derive(Debug)]
enum TaskOutcome {
    Parsed { page_url: Url, links: Vec<String> },
    Failed,
    /// Cancelled before its request went out or while waiting to retry;
    /// never reached a terminal state
    Abandoned,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    pipeline: Arc<Pipeline>,
    scheduler: Arc<Scheduler>,
    fetcher: Fetcher,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The run configuration; its seeds become the crawl input
    /// * `pipeline` - Receives every fetched page
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Configuration valid, seeds parsed and HTTP client built
    /// * `Err(DovepeakError::Config)` - A limit is out of range or a seed is unusable
    /// * `Err(DovepeakError::Reqwest)` - The HTTP client failed to build
    pub fn new(config: Config, pipeline: Pipeline) -> Result<Self, DovepeakError> {
        validate(&config)?;
        let scheduler = Scheduler::new(&config.crawler, &config.seeds)?;
        let fetcher = Fetcher::new(&config)?;

        Ok(Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            scheduler: Arc::new(scheduler),
            fetcher,
            cancel: CancellationToken::new(),
        })
    }

    /// Token that stops the run when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn pipeline(&self) -> Arc<Pipeline> {
        self.pipeline.clone()
    }

    /// Spawns the run on the current runtime
    pub fn start(self) -> RunHandle {
        let pipeline = self.pipeline.clone();
        let cancel = self.cancel.clone();
        let task = tokio::spawn(self.run());
        RunHandle {
            pipeline,
            cancel,
            task,
        }
    }

    /// Runs the crawl until every domain is done or the run is cancelled
    pub async fn run(self) -> RunSnapshot {
        let start_time = Instant::now();
        let max_in_flight = self.config.crawler.max_domains_in_flight as usize;
        info!(
            "Starting crawl of {} domains ({} in flight)",
            self.scheduler.pending_domains(),
            max_in_flight
        );

        let worker = DomainWorker {
            config: self.config.clone(),
            pipeline: self.pipeline.clone(),
            scheduler: self.scheduler.clone(),
            fetcher: self.fetcher.clone(),
            cancel: self.cancel.clone(),
        };
        let mut workers = JoinSet::new();

        loop {
            while workers.len() < max_in_flight && !self.cancel.is_cancelled() {
                match self.scheduler.next_seed() {
                    Some(seed) => {
                        workers.spawn(worker.clone().crawl_domain(seed));
                    }
                    None => break,
                }
            }

            match workers.join_next().await {
                Some(Ok(())) => {}
                Some(Err(e)) => error!("Domain worker failed: {}", e),
                None => break,
            }
        }

        if self.cancel.is_cancelled() {
            info!(
                "Crawl cancelled after {:?}, {} domains never started",
                start_time.elapsed(),
                self.scheduler.pending_domains()
            );
        } else {
            info!(
                "Crawl completed: {} pages dispatched in {:?}",
                self.scheduler.dispatched(),
                start_time.elapsed()
            );
        }

        self.pipeline.snapshot()
    }
}

/// Handle to a running crawl
#[derive(Debug)]
pub struct RunHandle {
    pipeline: Arc<Pipeline>,
    cancel: CancellationToken,
    task: JoinHandle<RunSnapshot>,
}

impl RunHandle {
    /// Current records and stats, readable while the run is in progress
    pub fn snapshot(&self) -> RunSnapshot {
        self.pipeline.snapshot()
    }

    /// Stops new dispatches; in-flight fetches finish or time out
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Pages that failed permanently so far
    pub fn pages_failed(&self) -> u64 {
        self.pipeline.stats().pages_failed()
    }

    /// Waits for the run to end and returns the final snapshot
    pub async fn join(self) -> Result<RunSnapshot, DovepeakError> {
        Ok(self.task.await?)
    }
}

/// Crawls the pages of one domain, one fetch at a time
#[derive(Clone)]
struct DomainWorker {
    config: Arc<Config>,
    pipeline: Arc<Pipeline>,
    scheduler: Arc<Scheduler>,
    fetcher: Fetcher,
    cancel: CancellationToken,
}

impl DomainWorker {
    async fn crawl_domain(self, seed: CrawlTask) {
        let mut frontier = DomainFrontier::new(seed, &self.config.crawler);
        let mut started = false;
        let mut pages = 0u32;

        while let Some(mut task) = frontier.pop() {
            if self.cancel.is_cancelled() {
                debug!("Run cancelled, leaving {} pages of {}", frontier.len() + 1, frontier.domain());
                break;
            }
            if !self.scheduler.try_reserve_page() {
                debug!("Total page budget used, stopping {}", frontier.domain());
                break;
            }

            if !started {
                self.pipeline.record_event(StatsEvent::DomainStarted);
                started = true;
            }
            pages += 1;

            let outcome = match self.run_task(&mut task, &mut frontier.state).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Task {} broke its state machine: {}", task.url, e);
                    TaskOutcome::Failed
                }
            };

            match outcome {
                TaskOutcome::Parsed { page_url, links } => {
                    self.pipeline
                        .record_event(StatsEvent::PageFinished { failed: false });
                    for url in discover_links(&page_url, &links, &self.config.crawler.link_patterns)
                    {
                        frontier.push(url);
                    }
                }
                TaskOutcome::Failed => {
                    self.pipeline
                        .record_event(StatsEvent::PageFinished { failed: true });
                }
                TaskOutcome::Abandoned => break,
            }
        }

        debug!("Finished {} after {} pages", frontier.domain(), pages);
    }

    /// Drives one task from `queued` to a terminal state
    async fn run_task(
        &self,
        task: &mut CrawlTask,
        domain: &mut DomainState,
    ) -> Result<TaskOutcome, DovepeakError> {
        let crawler = &self.config.crawler;

        loop {
            task.transition(TaskState::Fetching)?;
            debug!("Fetching {} (attempt {})", task.url, task.attempt);

            match self.fetcher.fetch_polite(domain, &task.url, &self.cancel).await {
                Ok(page) => {
                    let (found, links) = match scan_page(&page) {
                        Ok(scan) => (
                            self.pipeline.process_candidates(scan.candidates).await,
                            scan.links,
                        ),
                        Err(e) => {
                            warn!("No candidates from {}: {}", page.url, e);
                            (0, Vec::new())
                        }
                    };
                    debug!(
                        "Parsed {}: {} candidates, {} links",
                        page.url,
                        found,
                        links.len()
                    );
                    task.transition(TaskState::Parsed)?;
                    return Ok(TaskOutcome::Parsed {
                        page_url: page.url,
                        links,
                    });
                }
                Err(FetchError::Cancelled) => {
                    debug!("Run cancelled before fetching {}", task.url);
                    return Ok(TaskOutcome::Abandoned);
                }
                // Only transient kinds are retried: timeouts, connection and
                // transport errors, 5xx, 408 and 429. Other 4xx, oversized
                // bodies and redirect loops fail the page on the first attempt.
                Err(e) if e.is_transient() && task.attempt < crawler.retry_budget => {
                    task.transition(TaskState::Retrying)?;
                    let delay = retry_delay(crawler.retry_base_delay_ms, task.attempt);
                    warn!(
                        "Fetch of {} failed ({}), retrying in {:?} ({}/{})",
                        task.url, e, delay, task.attempt, crawler.retry_budget
                    );

                    tokio::select! {
                        _ = self.cancel.cancelled() => return Ok(TaskOutcome::Abandoned),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(e) => {
                    warn!(
                        "Giving up on {} after {} attempts: {}",
                        task.url, task.attempt, e
                    );
                    task.transition(TaskState::Failed)?;
                    return Ok(TaskOutcome::Failed);
                }
            }
        }
    }
}
