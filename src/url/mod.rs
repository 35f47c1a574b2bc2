//! URL handling module for Dovepeak
//!
//! This module provides page URL normalization, crawl domain extraction,
//! seed parsing and link-pattern matching for page discovery.

mod domain;
mod matcher;
mod normalize;

pub use domain::{extract_domain, is_same_domain, seed_url};
pub use matcher::matches_link_pattern;
pub use normalize::normalize_url;

use url::Url;

/// Selects the links of a page worth crawling next
///
/// Keeps links on the same crawl domain as `base` whose path matches one of
/// `patterns`. Links are normalized and returned in first-seen order without
/// duplicates.
pub fn discover_links(base: &Url, links: &[String], patterns: &[String]) -> Vec<Url> {
    let mut discovered: Vec<Url> = Vec::new();

    for link in links {
        let normalized = match normalize_url(link) {
            Ok(u) => u,
            Err(e) => {
                tracing::trace!("Skipping link {}: {}", link, e);
                continue;
            }
        };

        if !is_same_domain(base, &normalized) || !matches_link_pattern(&normalized, patterns) {
            continue;
        }

        if !discovered.contains(&normalized) {
            discovered.push(normalized);
        }
    }

    discovered
}
