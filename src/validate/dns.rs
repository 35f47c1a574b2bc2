//! Domain resolvability tier
//!
//! An address passes when its domain has an MX record, or failing that an
//! A/AAAA record (implicit MX). Resolver timeouts and server failures give
//! `Unknown`, never `Fail`.

use crate::config::ValidationConfig;
use crate::email::split_address;
use crate::validate::{TierContext, TierLevel, ValidationError, ValidationTier, Verdict};
use async_trait::async_trait;
use dashmap::DashMap;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::TokioAsyncResolver;
use std::sync::Arc;
use std::time::Duration;

/// Definitive answer about a mail domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainLookup {
    /// Mail hosts, most preferred first
    Resolved(Vec<String>),
    /// The domain exists nowhere in DNS or has neither MX nor address records
    NoRecords,
}

/// Looks up where mail for a domain goes
///
/// `Err` means the answer is not known right now (timeout, SERVFAIL, no network).
#[async_trait]
pub trait MailDomainResolver: Send + Sync {
    async fn resolve(&self, domain: &str) -> Result<DomainLookup, ValidationError>;
}

/// System resolver backed by hickory
pub struct HickoryResolver {
    resolver: TokioAsyncResolver,
}

impl HickoryResolver {
    /// Uses the system resolver configuration, falling back to public resolvers
    pub fn new(config: &ValidationConfig) -> Self {
        let (resolver_config, mut opts) = match hickory_resolver::system_conf::read_system_conf() {
            Ok(conf) => conf,
            Err(e) => {
                tracing::warn!("Could not read system DNS configuration ({}), using defaults", e);
                (ResolverConfig::default(), ResolverOpts::default())
            }
        };
        opts.timeout = Duration::from_millis(config.dns_timeout_ms);
        opts.attempts = config.dns_attempts;

        Self {
            resolver: TokioAsyncResolver::tokio(resolver_config, opts),
        }
    }

    async fn address_records(&self, domain: &str) -> Result<DomainLookup, ValidationError> {
        match self.resolver.lookup_ip(domain).await {
            Ok(ips) if ips.iter().next().is_some() => {
                Ok(DomainLookup::Resolved(vec![domain
                    .trim_end_matches('.')
                    .to_string()]))
            }
            Ok(_) => Ok(DomainLookup::NoRecords),
            Err(e) if is_no_records(&e) => Ok(DomainLookup::NoRecords),
            Err(e) => Err(ValidationError::Dns(e.to_string())),
        }
    }
}

#[async_trait]
impl MailDomainResolver for HickoryResolver {
    async fn resolve(&self, domain: &str) -> Result<DomainLookup, ValidationError> {
        let fqdn = format!("{}.", domain.trim_end_matches('.'));

        match self.resolver.mx_lookup(fqdn.as_str()).await {
            Ok(mx) => {
                let mut records: Vec<(u16, String)> = mx
                    .iter()
                    .map(|r| {
                        (
                            r.preference(),
                            r.exchange().to_utf8().trim_end_matches('.').to_string(),
                        )
                    })
                    .collect();
                records.sort();

                // null MX: the domain explicitly accepts no mail
                if records.iter().all(|(_, host)| host.is_empty()) {
                    return Ok(DomainLookup::NoRecords);
                }

                Ok(DomainLookup::Resolved(
                    records
                        .into_iter()
                        .map(|(_, host)| host)
                        .filter(|host| !host.is_empty())
                        .collect(),
                ))
            }
            Err(e) if is_no_records(&e) => self.address_records(&fqdn).await,
            Err(e) => {
                if matches!(e.kind(), ResolveErrorKind::Timeout) {
                    Err(ValidationError::Timeout(format!("MX lookup for {}", domain)))
                } else {
                    Err(ValidationError::Dns(e.to_string()))
                }
            }
        }
    }
}

fn is_no_records(e: &ResolveError) -> bool {
    matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. })
}

/// Second tier: the address's domain must be able to receive mail
///
/// Definitive answers are cached per domain for the lifetime of the tier, so
/// many addresses on one domain cost a single lookup.
pub struct DomainTier {
    resolver: Arc<dyn MailDomainResolver>,
    cache: DashMap<String, DomainLookup>,
}

impl DomainTier {
    pub fn new(resolver: Arc<dyn MailDomainResolver>) -> Self {
        Self {
            resolver,
            cache: DashMap::new(),
        }
    }

    async fn lookup(&self, domain: &str) -> Result<DomainLookup, ValidationError> {
        if let Some(hit) = self.cache.get(domain) {
            return Ok(hit.value().clone());
        }

        let answer = self.resolver.resolve(domain).await?;
        self.cache.insert(domain.to_string(), answer.clone());
        Ok(answer)
    }
}

#[async_trait]
impl ValidationTier for DomainTier {
    fn name(&self) -> &'static str {
        "domain"
    }

    fn level(&self) -> TierLevel {
        TierLevel::Domain
    }

    async fn evaluate(&self, address: &str, ctx: &mut TierContext) -> Verdict {
        let Some((_, domain)) = split_address(address) else {
            return Verdict::Fail("address has no domain".to_string());
        };

        match self.lookup(domain).await {
            Ok(DomainLookup::Resolved(hosts)) => {
                ctx.mail_hosts = hosts;
                Verdict::Pass
            }
            Ok(DomainLookup::NoRecords) => {
                Verdict::Fail(format!("{} has no mail exchange or address records", domain))
            }
            Err(e) => {
                tracing::warn!("Domain check for {} inconclusive: {}", domain, e);
                Verdict::Unknown(e.to_string())
            }
        }
    }
}
