use serde::Deserialize;

/// Main configuration structure for Dovepeak
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    pub output: OutputConfig,
    /// Seed domains (bare domains or URLs) crawled in this run
    #[serde(default)]
    pub seeds: Vec<String>,
}

/// Crawl scheduling and politeness configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of domains crawled in parallel
    #[serde(rename = "max-domains-in-flight")]
    pub max_domains_in_flight: u32,

    /// Maximum number of pages fetched per domain, seed page included
    #[serde(rename = "max-pages-per-domain")]
    pub max_pages_per_domain: u32,

    /// Maximum number of pages dispatched across the whole run
    #[serde(rename = "max-total-pages")]
    pub max_total_pages: u32,

    /// Minimum time between requests to the same domain (milliseconds)
    #[serde(rename = "politeness-delay-ms")]
    pub politeness_delay_ms: u64,

    /// Maximum number of fetch attempts per page
    #[serde(rename = "retry-budget")]
    pub retry_budget: u32,

    /// Backoff before the first retry; doubled on each further retry (milliseconds)
    #[serde(rename = "retry-base-delay-ms", default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Path keywords that make a same-domain link worth following
    #[serde(rename = "link-patterns", default = "default_link_patterns")]
    pub link_patterns: Vec<String>,

    /// Paths probed on every seed regardless of the links found on it
    #[serde(rename = "common-paths", default = "default_common_paths")]
    pub common_paths: Vec<String>,
}

/// HTTP fetch limits
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Wall-clock timeout per request, body included (milliseconds)
    #[serde(rename = "timeout-ms", default = "default_fetch_timeout_ms")]
    pub timeout_ms: u64,

    /// Largest accepted response body
    #[serde(rename = "max-body-bytes", default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Redirect hops followed before giving up
    #[serde(rename = "max-redirects", default = "default_max_redirects")]
    pub max_redirects: usize,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Validation tier switches and network limits
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    #[serde(rename = "enable-syntax-check", default = "default_true")]
    pub enable_syntax_check: bool,

    #[serde(rename = "enable-domain-check", default = "default_true")]
    pub enable_domain_check: bool,

    /// Off by default: probing talks to remote mail servers on port 25
    #[serde(rename = "enable-mailbox-probe", default)]
    pub enable_mailbox_probe: bool,

    #[serde(rename = "dns-timeout-ms", default = "default_dns_timeout_ms")]
    pub dns_timeout_ms: u64,

    #[serde(rename = "dns-attempts", default = "default_dns_attempts")]
    pub dns_attempts: usize,

    #[serde(rename = "smtp-timeout-ms", default = "default_smtp_timeout_ms")]
    pub smtp_timeout_ms: u64,

    /// Envelope sender used in `MAIL FROM` during mailbox probes
    #[serde(rename = "smtp-sender", default = "default_smtp_sender")]
    pub smtp_sender: String,

    /// Name announced in `EHLO`
    #[serde(rename = "smtp-helo", default = "default_smtp_helo")]
    pub smtp_helo: String,
}

/// How repeated sightings of one address combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    /// Keep the highest sighting score
    #[default]
    Max,
    /// Rounded mean of all sighting scores
    Mean,
}

/// Scoring configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringConfig {
    #[serde(rename = "merge-policy", default)]
    pub merge_policy: MergePolicy,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the CSV results file
    #[serde(rename = "results-path")]
    pub results_path: String,

    /// Optional path of a JSON export (records plus stats)
    #[serde(rename = "json-path", default)]
    pub json_path: Option<String>,

    /// Path to the markdown summary file
    #[serde(rename = "summary-path")]
    pub summary_path: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_fetch_timeout_ms(),
            max_body_bytes: default_max_body_bytes(),
            max_redirects: default_max_redirects(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enable_syntax_check: true,
            enable_domain_check: true,
            enable_mailbox_probe: false,
            dns_timeout_ms: default_dns_timeout_ms(),
            dns_attempts: default_dns_attempts(),
            smtp_timeout_ms: default_smtp_timeout_ms(),
            smtp_sender: default_smtp_sender(),
            smtp_helo: default_smtp_helo(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

pub(crate) fn default_link_patterns() -> Vec<String> {
    ["contact", "about", "staff", "team", "careers", "jobs", "support", "press", "impressum"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_common_paths() -> Vec<String> {
    vec!["/contact".to_string(), "/about".to_string()]
}

fn default_fetch_timeout_ms() -> u64 {
    15_000
}

fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

fn default_max_redirects() -> usize {
    5
}

fn default_dns_timeout_ms() -> u64 {
    3_000
}

fn default_dns_attempts() -> usize {
    2
}

fn default_smtp_timeout_ms() -> u64 {
    10_000
}

fn default_smtp_sender() -> String {
    "verify@localhost".to_string()
}

fn default_smtp_helo() -> String {
    "localhost".to_string()
}
