//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - Enforcing the body size ceiling and request timeout
//! - The politeness delay between requests to one domain
//! - Error classification into transient and permanent failures

use crate::config::{Config, CrawlerConfig, FetcherConfig, UserAgentConfig};
use crate::extract::PageContent;
use crate::state::DomainState;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use url::Url;

/// Why a page could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection refused")]
    ConnectionRefused,

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("response body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("too many redirects")]
    TooManyRedirects,

    #[error("transport error: {0}")]
    Transport(String),

    /// The run was cancelled before the request was sent
    #[error("cancelled before sending")]
    Cancelled,
}

impl FetchError {
    /// Returns true if another attempt may succeed
    ///
    /// | Error | Retried |
    /// |-------|---------|
    /// | Timeout, connection refused, transport | yes |
    /// | HTTP 5xx, 408, 429 | yes |
    /// | Other HTTP statuses | no |
    /// | Too large, too many redirects | no |
    /// | Cancelled | no |
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::ConnectionRefused | Self::Transport(_) => true,
            Self::HttpStatus(code) => *code >= 500 || *code == 408 || *code == 429,
            Self::TooLarge { .. } | Self::TooManyRedirects | Self::Cancelled => false,
        }
    }

    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_redirect() {
            Self::TooManyRedirects
        } else if e.is_connect() {
            Self::ConnectionRefused
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `fetcher` - Timeout and redirect limits
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use dovepeak::config::{FetcherConfig, UserAgentConfig};
/// use dovepeak::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "Dovepeak".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, &FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    fetcher: &FetcherConfig,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        user_agent.crawler_name,
        user_agent.crawler_version,
        user_agent.contact_url,
        user_agent.contact_email
    );
    let timeout = Duration::from_millis(fetcher.timeout_ms);

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(fetcher.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages for the crawl workers
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    crawler: CrawlerConfig,
    max_body_bytes: usize,
}

impl Fetcher {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(&config.user_agent, &config.fetcher)?,
            crawler: config.crawler.clone(),
            max_body_bytes: config.fetcher.max_body_bytes,
        })
    }

    /// Fetches a page after waiting out the domain's politeness delay
    ///
    /// The caller must serialize calls for one domain; `domain` records the
    /// request time and is marked rate limited on HTTP 429. Cancellation
    /// during the wait returns `FetchError::Cancelled` and sends nothing.
    pub async fn fetch_polite(
        &self,
        domain: &mut DomainState,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<PageContent, FetchError> {
        if let Some(wait) = domain.time_until_next_request(&self.crawler, Instant::now()) {
            trace!("Waiting {:?} before {}", wait, url);
            tokio::select! {
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                _ = tokio::time::sleep(wait) => {}
            }
        }
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        domain.record_request(Instant::now());

        let result = self.fetch(url).await;
        if matches!(result, Err(FetchError::HttpStatus(429))) {
            domain.mark_rate_limited();
        }
        result
    }

    /// Fetches one URL
    ///
    /// Non-2xx statuses are errors. The body is read in chunks and the
    /// request is abandoned as soon as it crosses the size ceiling.
    pub async fn fetch(&self, url: &Url) -> Result<PageContent, FetchError> {
        debug!("GET {}", url);
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let limit = self.max_body_bytes;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(FetchError::TooLarge { limit });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(FetchError::from_reqwest)? {
            if body.len() + chunk.len() > limit {
                return Err(FetchError::TooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }

        trace!("{} {} ({} bytes)", status.as_u16(), final_url, body.len());
        Ok(PageContent::new(
            final_url,
            String::from_utf8_lossy(&body).into_owned(),
            content_type,
        ))
    }
}
