use crate::validate::{TierContext, TierLevel, ValidationTier, Verdict};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

static ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-z0-9._%+-]{1,64}@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,24}$")
        .expect("address grammar")
});

const MAX_ADDRESS_LEN: usize = 254;

/// Checks an address against the accepted grammar
///
/// ASCII local part of at most 64 characters without leading, trailing or
/// doubled dots; domain of valid labels ending in an alphabetic TLD.
///
/// # Examples
///
/// ```
/// use dovepeak::validate::check_syntax;
///
/// assert!(check_syntax("info@example.org").is_ok());
/// assert!(check_syntax("not-an-email").is_err());
/// ```
pub fn check_syntax(address: &str) -> Result<(), String> {
    if address.len() > MAX_ADDRESS_LEN {
        return Err(format!("longer than {} characters", MAX_ADDRESS_LEN));
    }

    if !ADDRESS.is_match(address) {
        return Err("does not match local-part@domain grammar".to_string());
    }

    let local = address.split('@').next().unwrap_or("");
    if local.starts_with('.') || local.ends_with('.') {
        return Err("local part starts or ends with a dot".to_string());
    }
    if local.contains("..") {
        return Err("local part contains consecutive dots".to_string());
    }

    Ok(())
}

/// First tier: grammar only, no network
#[derive(Debug, Default)]
pub struct SyntaxTier;

#[async_trait]
impl ValidationTier for SyntaxTier {
    fn name(&self) -> &'static str {
        "syntax"
    }

    fn level(&self) -> TierLevel {
        TierLevel::Syntax
    }

    async fn evaluate(&self, address: &str, _ctx: &mut TierContext) -> Verdict {
        match check_syntax(address) {
            Ok(()) => Verdict::Pass,
            Err(reason) => Verdict::Fail(reason),
        }
    }
}
