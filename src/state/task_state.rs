/// Crawl task states and the task record driven through them
use crate::DovepeakError;
use std::fmt;
use url::Url;

/// Represents the current state of a crawl task
///
/// ```text
/// queued -> fetching -> parsed
///                    -> failed
///                    -> retrying -> fetching
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    // ===== Active States =====
    /// Task is waiting for its domain worker
    Queued,

    /// A fetch attempt is in flight
    Fetching,

    /// Last attempt failed transiently; waiting out the backoff
    Retrying,

    // ===== Terminal States =====
    /// Page was fetched and its content went through extraction
    Parsed,

    /// Fetch failed permanently or the retry budget is exhausted
    Failed,
}

impl TaskState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Parsed | Self::Failed)
    }

    /// Returns true if the task may still be fetched
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if moving from `self` to `next` is a legal step
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Fetching)
                | (Self::Fetching, Self::Parsed)
                | (Self::Fetching, Self::Failed)
                | (Self::Fetching, Self::Retrying)
                | (Self::Retrying, Self::Fetching)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Fetching => "fetching",
            Self::Retrying => "retrying",
            Self::Parsed => "parsed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One page of one domain, tracked from queueing to its terminal state
#[derive(Debug, Clone)]
pub struct CrawlTask {
    pub domain: String,
    pub url: Url,
    /// Number of fetch attempts started so far
    pub attempt: u32,
    state: TaskState,
}

impl CrawlTask {
    pub fn new(domain: String, url: Url) -> Self {
        Self {
            domain,
            url,
            attempt: 0,
            state: TaskState::Queued,
        }
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Moves the task to `next`, counting an attempt on every entry into `Fetching`
    pub fn transition(&mut self, next: TaskState) -> Result<(), DovepeakError> {
        if !self.state.can_transition_to(next) {
            return Err(DovepeakError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        if next == TaskState::Fetching {
            self.attempt += 1;
        }
        self.state = next;
        Ok(())
    }
}
