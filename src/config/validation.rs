use crate::config::types::{
    Config, CrawlerConfig, FetcherConfig, OutputConfig, UserAgentConfig, ValidationConfig,
};
use crate::url::seed_url;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_validation_config(&config.validation)?;
    validate_output_config(&config.output)?;
    validate_seeds(&config.seeds)?;
    Ok(())
}

/// Validates crawler configuration
pub(crate) fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_domains_in_flight < 1 || config.max_domains_in_flight > 64 {
        return Err(ConfigError::Validation(format!(
            "max_domains_in_flight must be between 1 and 64, got {}",
            config.max_domains_in_flight
        )));
    }

    if config.max_pages_per_domain < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages_per_domain must be >= 1, got {}",
            config.max_pages_per_domain
        )));
    }

    if config.max_total_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_total_pages must be >= 1, got {}",
            config.max_total_pages
        )));
    }

    if config.retry_budget < 1 || config.retry_budget > 10 {
        return Err(ConfigError::Validation(format!(
            "retry_budget must be between 1 and 10, got {}",
            config.retry_budget
        )));
    }

    for pattern in &config.link_patterns {
        if pattern.trim().is_empty() {
            return Err(ConfigError::Validation(
                "link_patterns cannot contain empty entries".to_string(),
            ));
        }
    }

    for path in &config.common_paths {
        if !path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "common path '{}' must start with '/'",
                path
            )));
        }
    }

    Ok(())
}

/// Validates fetcher limits
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "fetcher timeout_ms must be >= 100ms, got {}ms",
            config.timeout_ms
        )));
    }

    if config.max_body_bytes < 1024 {
        return Err(ConfigError::Validation(format!(
            "max_body_bytes must be >= 1024, got {}",
            config.max_body_bytes
        )));
    }

    if config.max_redirects > 10 {
        return Err(ConfigError::Validation(format!(
            "max_redirects must be <= 10, got {}",
            config.max_redirects
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email("contact_email", &config.contact_email)?;

    Ok(())
}

/// Validates the tier switches and their network limits
fn validate_validation_config(config: &ValidationConfig) -> Result<(), ConfigError> {
    if config.enable_domain_check {
        if config.dns_timeout_ms < 100 {
            return Err(ConfigError::Validation(format!(
                "dns_timeout_ms must be >= 100ms, got {}ms",
                config.dns_timeout_ms
            )));
        }
        if config.dns_attempts < 1 {
            return Err(ConfigError::Validation(
                "dns_attempts must be >= 1".to_string(),
            ));
        }
    }

    if config.enable_mailbox_probe {
        if !config.enable_domain_check {
            return Err(ConfigError::Validation(
                "enable_mailbox_probe requires enable_domain_check to find mail servers"
                    .to_string(),
            ));
        }
        if config.smtp_timeout_ms < 100 {
            return Err(ConfigError::Validation(format!(
                "smtp_timeout_ms must be >= 100ms, got {}ms",
                config.smtp_timeout_ms
            )));
        }
        validate_email("smtp_sender", &config.smtp_sender)?;
        if config.smtp_helo.trim().is_empty() {
            return Err(ConfigError::Validation(
                "smtp_helo cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.results_path.is_empty() {
        return Err(ConfigError::Validation(
            "results_path cannot be empty".to_string(),
        ));
    }

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty".to_string(),
        ));
    }

    if matches!(&config.json_path, Some(p) if p.is_empty()) {
        return Err(ConfigError::Validation(
            "json_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates that every seed turns into a crawlable base URL
pub(crate) fn validate_seeds(seeds: &[String]) -> Result<(), ConfigError> {
    for seed in seeds {
        seed_url(seed)
            .map_err(|e| ConfigError::InvalidSeed(format!("'{}': {}", seed, e)))?;
    }
    Ok(())
}

/// Basic email shape check for configuration values
fn validate_email(field: &str, email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", field)));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid {} format: '{}'",
            field, email
        )));
    }

    Ok(())
}
