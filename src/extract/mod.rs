//! Extraction and classification of email candidates
//!
//! - `scan_page` / `extract_candidates`: lazy scan of one page for addresses
//! - `Classifier`: ordered role rules assigning an `EmailType`

mod classifier;
mod extractor;

pub use classifier::{ClassificationRule, Classifier, GenericOnContactPage, PrefixRule};
pub use extractor::{extract_candidates, scan_page, Candidates, PageScan};

use crate::url::extract_domain;
use chrono::{DateTime, Utc};
use thiserror::Error;
use url::Url;

/// Content of one fetched page, owned by the task processing it
#[derive(Debug, Clone)]
pub struct PageContent {
    pub url: Url,
    pub domain: String,
    pub body: String,
    /// `Content-Type` header value, if the server sent one
    pub content_type: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

impl PageContent {
    pub fn new(url: Url, body: String, content_type: Option<String>) -> Self {
        let domain = extract_domain(&url).unwrap_or_default();
        Self {
            url,
            domain,
            body,
            content_type,
            fetched_at: Utc::now(),
        }
    }
}

/// Page content that cannot be scanned
///
/// Never fatal: the page simply yields no candidates.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("page body is empty")]
    Empty,

    #[error("page body looks binary")]
    Binary,

    #[error("unsupported content type: {0}")]
    UnsupportedContent(String),
}
