//! Tiered address validation
//!
//! Tiers run in order (syntax, domain, mailbox). A tier only runs if no
//! earlier tier failed. Network trouble in the domain and mailbox tiers is
//! reported as `Unknown`, which never disqualifies an address.

mod dns;
mod mailbox;
mod syntax;

pub use dns::{DomainLookup, DomainTier, HickoryResolver, MailDomainResolver};
pub use mailbox::{MailboxProber, MailboxTier, ProbeOutcome, SmtpProber};
pub use syntax::{check_syntax, SyntaxTier};

use crate::config::ValidationConfig;
use crate::email::split_address;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Failures of the network tiers
///
/// These never reach the caller of `Validator::validate`; they are logged
/// and downgraded to `Verdict::Unknown`.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("DNS error: {0}")]
    Dns(String),

    #[error("SMTP error: {0}")]
    Smtp(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of one tier for one address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail(String),
    /// Inconclusive; treated as a soft pass
    Unknown(String),
    /// Tier disabled or not reached
    Skipped,
}

impl Verdict {
    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TierLevel {
    Syntax,
    Domain,
    Mailbox,
}

/// Facts one tier hands to the next for the same address
#[derive(Debug, Clone, Default)]
pub struct TierContext {
    /// Mail hosts of the address's domain, most preferred first
    pub mail_hosts: Vec<String>,
}

/// One validation check
#[async_trait]
pub trait ValidationTier: Send + Sync {
    fn name(&self) -> &'static str;

    fn level(&self) -> TierLevel;

    async fn evaluate(&self, address: &str, ctx: &mut TierContext) -> Verdict;
}

/// Highest validation outcome reached by an address
///
/// Variants are ordered from weakest to strongest evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValidationLevel {
    SyntaxFailed,
    DomainFailed,
    SyntaxOnly,
    DomainUnknown,
    MailboxRejected,
    MailboxUnknown,
    DomainResolved,
    MailboxConfirmed,
}

/// Verdicts of every tier for one address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub syntax: Verdict,
    pub domain: Verdict,
    pub mailbox: Verdict,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self {
            syntax: Verdict::Skipped,
            domain: Verdict::Skipped,
            mailbox: Verdict::Skipped,
        }
    }
}

impl ValidationReport {
    fn record(&mut self, level: TierLevel, verdict: Verdict) {
        match level {
            TierLevel::Syntax => self.syntax = verdict,
            TierLevel::Domain => self.domain = verdict,
            TierLevel::Mailbox => self.mailbox = verdict,
        }
    }

    pub fn has_failure(&self) -> bool {
        self.syntax.is_fail() || self.domain.is_fail() || self.mailbox.is_fail()
    }

    /// Syntax did not fail and the domain is not known to be unable to receive mail
    pub fn is_valid(&self) -> bool {
        !self.syntax.is_fail() && !self.domain.is_fail()
    }

    pub fn level(&self) -> ValidationLevel {
        if self.syntax.is_fail() {
            return ValidationLevel::SyntaxFailed;
        }
        if self.domain.is_fail() {
            return ValidationLevel::DomainFailed;
        }

        match (&self.domain, &self.mailbox) {
            (_, Verdict::Pass) => ValidationLevel::MailboxConfirmed,
            (_, Verdict::Fail(_)) => ValidationLevel::MailboxRejected,
            (Verdict::Pass, Verdict::Unknown(_)) => ValidationLevel::MailboxUnknown,
            (Verdict::Pass, _) => ValidationLevel::DomainResolved,
            (Verdict::Unknown(_), _) => ValidationLevel::DomainUnknown,
            _ => ValidationLevel::SyntaxOnly,
        }
    }
}

/// Ordered list of validation tiers
pub struct Validator {
    tiers: Vec<Box<dyn ValidationTier>>,
}

impl Validator {
    pub fn new(tiers: Vec<Box<dyn ValidationTier>>) -> Self {
        Self { tiers }
    }

    /// Builds the enabled tiers from configuration
    ///
    /// # Arguments
    ///
    /// * `config` - Tier switches
    /// * `resolver` - Used by the domain tier
    /// * `prober` - Used by the mailbox tier
    pub fn from_config(
        config: &ValidationConfig,
        resolver: Arc<dyn MailDomainResolver>,
        prober: Arc<dyn MailboxProber>,
    ) -> Self {
        let mut tiers: Vec<Box<dyn ValidationTier>> = Vec::new();

        if config.enable_syntax_check {
            tiers.push(Box::new(SyntaxTier));
        }
        if config.enable_domain_check {
            tiers.push(Box::new(DomainTier::new(resolver)));
        }
        if config.enable_mailbox_probe {
            tiers.push(Box::new(MailboxTier::new(prober)));
        }

        Self::new(tiers)
    }

    /// Validator with the system resolver and an SMTP prober
    pub fn with_network(config: &ValidationConfig) -> Self {
        Self::from_config(
            config,
            Arc::new(HickoryResolver::new(config)),
            Arc::new(SmtpProber::new(config)),
        )
    }

    pub fn tier_names(&self) -> Vec<&'static str> {
        self.tiers.iter().map(|t| t.name()).collect()
    }

    /// Runs the tiers for one address, stopping at the first failure
    ///
    /// Input without a local part and a domain fails the syntax verdict even
    /// when the syntax tier is disabled.
    pub async fn validate(&self, address: &str) -> ValidationReport {
        let mut report = ValidationReport::default();
        let mut ctx = TierContext::default();

        if split_address(address).is_none() {
            report.syntax = Verdict::Fail("not of the form local@domain".to_string());
            return report;
        }

        for tier in &self.tiers {
            if report.has_failure() {
                break;
            }
            let verdict = tier.evaluate(address, &mut ctx).await;
            tracing::trace!("{} tier for {}: {:?}", tier.name(), address, verdict);
            report.record(tier.level(), verdict);
        }

        report
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("tiers", &self.tier_names())
            .finish()
    }
}
