//! Role classification of addresses
//!
//! Rules are evaluated in order and the first rule that returns a type wins.
//! An address no rule claims is `Other`.

use crate::email::{EmailCandidate, EmailType, SourceCategory};

/// One named classification rule
pub trait ClassificationRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns a type if this rule claims the address
    fn evaluate(&self, local_part: &str, category: SourceCategory) -> Option<EmailType>;
}

/// Matches local parts equal to, or starting with, one of `tokens`
#[derive(Debug, Clone)]
pub struct PrefixRule {
    pub name: &'static str,
    pub tokens: &'static [&'static str],
    pub email_type: EmailType,
}

impl ClassificationRule for PrefixRule {
    fn name(&self) -> &'static str {
        self.name
    }

    fn evaluate(&self, local_part: &str, _category: SourceCategory) -> Option<EmailType> {
        self.tokens
            .iter()
            .any(|token| local_part.starts_with(token))
            .then_some(self.email_type)
    }
}

/// Generic mailbox names found on a contact-like page are the site's contact address
#[derive(Debug, Clone)]
pub struct GenericOnContactPage {
    pub generic_locals: &'static [&'static str],
}

impl ClassificationRule for GenericOnContactPage {
    fn name(&self) -> &'static str {
        "generic-on-contact-page"
    }

    fn evaluate(&self, local_part: &str, category: SourceCategory) -> Option<EmailType> {
        if !category.is_contact_flavored() {
            return None;
        }
        self.generic_locals
            .contains(&local_part)
            .then_some(EmailType::Contact)
    }
}

const GENERIC_LOCALS: &[&str] = &[
    "hello",
    "hi",
    "office",
    "enquiries",
    "enquiry",
    "inquiries",
    "inquiry",
    "mail",
    "general",
    "reception",
    "team",
    "sales",
    "emergency",
    "frontdesk",
];

/// Ordered list of classification rules
pub struct Classifier {
    rules: Vec<Box<dyn ClassificationRule>>,
}

impl Classifier {
    pub fn new(rules: Vec<Box<dyn ClassificationRule>>) -> Self {
        Self { rules }
    }

    /// Classifies a candidate from its local part and source category
    pub fn classify(&self, candidate: &EmailCandidate) -> EmailType {
        self.classify_parts(candidate.local_part(), candidate.category)
    }

    pub fn classify_parts(&self, local_part: &str, category: SourceCategory) -> EmailType {
        let local_part = local_part.to_lowercase();
        for rule in &self.rules {
            if let Some(email_type) = rule.evaluate(&local_part, category) {
                tracing::trace!("{} classified {} as {}", rule.name(), local_part, email_type);
                return email_type;
            }
        }
        EmailType::Other
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(vec![
            Box::new(PrefixRule {
                name: "info",
                tokens: &["info"],
                email_type: EmailType::Info,
            }),
            Box::new(PrefixRule {
                name: "admin",
                tokens: &["admin", "webmaster", "postmaster", "hostmaster"],
                email_type: EmailType::Admin,
            }),
            Box::new(PrefixRule {
                name: "support",
                tokens: &["support", "help"],
                email_type: EmailType::Support,
            }),
            Box::new(PrefixRule {
                name: "contact",
                tokens: &["contact"],
                email_type: EmailType::Contact,
            }),
            Box::new(GenericOnContactPage {
                generic_locals: GENERIC_LOCALS,
            }),
        ])
    }
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("rules", &self.rule_names())
            .finish()
    }
}
