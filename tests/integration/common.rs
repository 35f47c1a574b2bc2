use async_trait::async_trait;
use dovepeak::config::{
    Config, CrawlerConfig, FetcherConfig, OutputConfig, ScoringConfig, UserAgentConfig,
    ValidationConfig,
};
use dovepeak::extract::Classifier;
use dovepeak::pipeline::Pipeline;
use dovepeak::validate::{
    DomainLookup, MailDomainResolver, MailboxProber, ProbeOutcome, ValidationError, Validator,
};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Domains that have mail records; everything else has none
pub struct StubResolver;

#[async_trait]
impl MailDomainResolver for StubResolver {
    async fn resolve(&self, domain: &str) -> Result<DomainLookup, ValidationError> {
        match domain {
            "example.org" | "stmaryshospital.com" | "generalhospital.org" => {
                Ok(DomainLookup::Resolved(vec![format!("mx.{}", domain)]))
            }
            "flaky.org" => Err(ValidationError::Timeout("MX lookup".to_string())),
            _ => Ok(DomainLookup::NoRecords),
        }
    }
}

/// Never reaches a verdict, like a server that greylists everything
pub struct StubProber;

#[async_trait]
impl MailboxProber for StubProber {
    async fn probe(&self, _host: &str, _address: &str) -> Result<ProbeOutcome, ValidationError> {
        Ok(ProbeOutcome::Inconclusive("451 greylisted".to_string()))
    }
}

/// Creates a test configuration crawling the given seeds
pub fn create_test_config(seeds: Vec<String>) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_domains_in_flight: 4,
            max_pages_per_domain: 10,
            max_total_pages: 100,
            politeness_delay_ms: 0,
            retry_budget: 3,
            retry_base_delay_ms: 10, // Very short for testing
            link_patterns: ["contact", "about", "staff", "careers"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            common_paths: vec![],
        },
        fetcher: FetcherConfig {
            timeout_ms: 5_000,
            max_body_bytes: 64 * 1024,
            max_redirects: 3,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        validation: ValidationConfig::default(),
        scoring: ScoringConfig::default(),
        output: OutputConfig {
            results_path: "./test_results.csv".to_string(),
            json_path: None,
            summary_path: "./test_summary.md".to_string(),
        },
        seeds,
    }
}

/// Pipeline with the default rules and the stub network tiers
pub fn create_test_pipeline(config: &Config) -> Pipeline {
    let validator = Validator::from_config(
        &config.validation,
        Arc::new(StubResolver),
        Arc::new(StubProber),
    );
    Pipeline::new(Classifier::default(), validator, config.scoring.merge_policy)
}

pub fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><head><title>Test</title></head><body>{}</body></html>", body),
        "text/html",
    )
}

/// Mounts an HTML page expected to be fetched exactly `times` times
pub async fn mount_page(server: &MockServer, page: &str, body: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(body))
        .expect(times)
        .mount(server)
        .await;
}
