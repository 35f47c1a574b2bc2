//! Mailbox probe tier
//!
//! Opens an SMTP session with the domain's mail host and stops after
//! `RCPT TO`; no message is ever sent. Only a permanent rejection of the
//! recipient fails the tier. Greylisting, policy blocks, unreachable port 25
//! and catch-all domains all give `Unknown`.

use crate::config::ValidationConfig;
use crate::email::split_address;
use crate::validate::{TierContext, TierLevel, ValidationError, ValidationTier, Verdict};
use async_trait::async_trait;
use lettre::transport::smtp::client::SmtpConnection;
use lettre::transport::smtp::commands::{Mail, Rcpt};
use lettre::transport::smtp::extension::ClientId;
use lettre::Address;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::net::ToSocketAddrs;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Mail hosts tried per address before giving up
const MAX_HOSTS_PER_PROBE: usize = 2;

/// Permanent rejections that are about the sender or policy, not the recipient
const POLICY_MARKERS: &[&str] = &[
    "policy",
    "spam",
    "blocked",
    "blacklist",
    "blocklist",
    "spamhaus",
    "reputation",
    "not permitted",
    "relay",
    "5.7.",
];

/// Server answer to `RCPT TO`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Accepted,
    /// Permanent rejection of the recipient
    Rejected(String),
    /// Anything that says nothing about the mailbox itself
    Inconclusive(String),
}

/// Asks a mail host whether it would accept mail for an address
#[async_trait]
pub trait MailboxProber: Send + Sync {
    async fn probe(&self, mail_host: &str, address: &str) -> Result<ProbeOutcome, ValidationError>;
}

/// SMTP prober on port 25
#[derive(Debug, Clone)]
pub struct SmtpProber {
    sender: String,
    helo: String,
    timeout: Duration,
}

impl SmtpProber {
    pub fn new(config: &ValidationConfig) -> Self {
        Self {
            sender: config.smtp_sender.clone(),
            helo: config.smtp_helo.clone(),
            timeout: Duration::from_millis(config.smtp_timeout_ms),
        }
    }
}

#[async_trait]
impl MailboxProber for SmtpProber {
    async fn probe(&self, mail_host: &str, address: &str) -> Result<ProbeOutcome, ValidationError> {
        let host = mail_host.to_string();
        let address = address.to_string();
        let prober = self.clone();

        // lettre's connection is blocking
        tokio::task::spawn_blocking(move || prober.probe_blocking(&host, &address))
            .await
            .map_err(|e| ValidationError::Smtp(format!("probe task failed: {}", e)))?
    }
}

impl SmtpProber {
    fn probe_blocking(&self, host: &str, address: &str) -> Result<ProbeOutcome, ValidationError> {
        let recipient = Address::from_str(address)
            .map_err(|e| ValidationError::Smtp(format!("invalid recipient {}: {}", address, e)))?;
        let sender = Address::from_str(&self.sender)
            .map_err(|e| ValidationError::Smtp(format!("invalid sender {}: {}", self.sender, e)))?;

        let socket_addr = (host, 25_u16)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| ValidationError::Smtp(format!("no address for mail host {}", host)))?;

        let client_id = ClientId::Domain(self.helo.clone());
        let mut conn = SmtpConnection::connect(socket_addr, Some(self.timeout), &client_id, None, None)
            .map_err(|e| ValidationError::Smtp(format!("connect to {}: {}", host, e)))?;

        if let Err(e) = conn.command(Mail::new(Some(sender), vec![])) {
            conn.quit().ok();
            return Ok(ProbeOutcome::Inconclusive(format!("MAIL FROM refused: {}", e)));
        }

        let outcome = match conn.command(Rcpt::new(recipient, vec![])) {
            Ok(_) => ProbeOutcome::Accepted,
            Err(e) => classify_rcpt_error(&e),
        };
        conn.quit().ok();

        tracing::debug!("RCPT TO:<{}> via {}: {:?}", address, host, outcome);
        Ok(outcome)
    }
}

fn classify_rcpt_error(error: &lettre::transport::smtp::Error) -> ProbeOutcome {
    let message = error.to_string();
    let lower = message.to_lowercase();

    if error.is_permanent() && !POLICY_MARKERS.iter().any(|m| lower.contains(m)) {
        ProbeOutcome::Rejected(message)
    } else {
        ProbeOutcome::Inconclusive(message)
    }
}

/// Third tier: confirm the mailbox with the domain's mail host
pub struct MailboxTier {
    prober: Arc<dyn MailboxProber>,
}

impl MailboxTier {
    pub fn new(prober: Arc<dyn MailboxProber>) -> Self {
        Self { prober }
    }
}

#[async_trait]
impl ValidationTier for MailboxTier {
    fn name(&self) -> &'static str {
        "mailbox"
    }

    fn level(&self) -> TierLevel {
        TierLevel::Mailbox
    }

    async fn evaluate(&self, address: &str, ctx: &mut TierContext) -> Verdict {
        let Some((_, domain)) = split_address(address) else {
            return Verdict::Fail("address has no domain".to_string());
        };

        if ctx.mail_hosts.is_empty() {
            return Verdict::Unknown("no mail host known for domain".to_string());
        }

        let mut last_reason = String::new();
        for host in ctx.mail_hosts.iter().take(MAX_HOSTS_PER_PROBE) {
            match self.prober.probe(host, address).await {
                Ok(ProbeOutcome::Accepted) => {
                    let decoy = format!("{}@{}", random_local_part(), domain);
                    return match self.prober.probe(host, &decoy).await {
                        Ok(ProbeOutcome::Accepted) => {
                            Verdict::Unknown(format!("{} accepts any recipient", domain))
                        }
                        _ => Verdict::Pass,
                    };
                }
                Ok(ProbeOutcome::Rejected(reason)) => return Verdict::Fail(reason),
                Ok(ProbeOutcome::Inconclusive(reason)) => last_reason = reason,
                Err(e) => {
                    tracing::warn!("Mailbox probe of {} via {} failed: {}", address, host, e);
                    last_reason = e.to_string();
                }
            }
        }

        Verdict::Unknown(last_reason)
    }
}

fn random_local_part() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();
    format!("dp-{}", suffix.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Accepts the listed recipients, rejects everything else
    struct ListProber {
        accepted: Vec<&'static str>,
        catch_all: bool,
        probed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MailboxProber for ListProber {
        async fn probe(&self, mail_host: &str, address: &str) -> Result<ProbeOutcome, ValidationError> {
            self.probed
                .lock()
                .unwrap()
                .push(format!("{}:{}", mail_host, address));
            if mail_host == "down.example.org" {
                return Err(ValidationError::Smtp("connection refused".to_string()));
            }
            if self.catch_all || self.accepted.contains(&address) {
                Ok(ProbeOutcome::Accepted)
            } else if address.starts_with("grey") {
                Ok(ProbeOutcome::Inconclusive("451 greylisted".to_string()))
            } else {
                Ok(ProbeOutcome::Rejected("550 no such user".to_string()))
            }
        }
    }

    fn tier(accepted: Vec<&'static str>, catch_all: bool) -> (MailboxTier, Arc<ListProber>) {
        let prober = Arc::new(ListProber {
            accepted,
            catch_all,
            probed: Mutex::new(Vec::new()),
        });
        (MailboxTier::new(prober.clone()), prober)
    }

    fn ctx(hosts: &[&str]) -> TierContext {
        TierContext {
            mail_hosts: hosts.iter().map(|h| h.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_accepted_mailbox_passes() {
        let (tier, _) = tier(vec!["info@example.org"], false);
        let verdict = tier
            .evaluate("info@example.org", &mut ctx(&["mx.example.org"]))
            .await;
        assert_eq!(verdict, Verdict::Pass);
    }

    #[tokio::test]
    async fn test_rejected_mailbox_fails() {
        let (tier, _) = tier(vec![], false);
        let verdict = tier
            .evaluate("ghost@example.org", &mut ctx(&["mx.example.org"]))
            .await;
        assert!(matches!(verdict, Verdict::Fail(_)));
    }

    #[tokio::test]
    async fn test_catch_all_is_unknown() {
        let (tier, prober) = tier(vec![], true);
        let verdict = tier
            .evaluate("anyone@example.org", &mut ctx(&["mx.example.org"]))
            .await;
        assert!(matches!(verdict, Verdict::Unknown(_)));
        assert_eq!(prober.probed.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_greylisting_is_unknown() {
        let (tier, _) = tier(vec![], false);
        let verdict = tier
            .evaluate("greylisted@example.org", &mut ctx(&["mx.example.org"]))
            .await;
        assert!(matches!(verdict, Verdict::Unknown(_)));
    }

    #[tokio::test]
    async fn test_falls_back_to_second_host() {
        let (tier, prober) = tier(vec!["info@example.org"], false);
        let verdict = tier
            .evaluate(
                "info@example.org",
                &mut ctx(&["down.example.org", "mx2.example.org"]),
            )
            .await;
        assert_eq!(verdict, Verdict::Pass);
        assert!(prober.probed.lock().unwrap()[1].starts_with("mx2.example.org:"));
    }

    #[tokio::test]
    async fn test_no_hosts_is_unknown() {
        let (tier, prober) = tier(vec!["info@example.org"], false);
        let verdict = tier.evaluate("info@example.org", &mut ctx(&[])).await;
        assert!(matches!(verdict, Verdict::Unknown(_)));
        assert!(prober.probed.lock().unwrap().is_empty());
    }

    #[test]
    fn test_random_local_part_shape() {
        let local = random_local_part();
        assert!(local.starts_with("dp-"));
        assert_eq!(local.len(), 19);
        assert_ne!(local, random_local_part());
    }
}
