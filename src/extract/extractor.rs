//! Email extraction from fetched pages
//!
//! HTML is parsed once by `crawler::parse_html` into text segments (body
//! text, footer text and `mailto:` targets, in document order) and links.
//! Segments are scanned lazily as the returned iterator is advanced.

use crate::crawler::{parse_html, Segment};
use crate::email::{
    normalize_address, split_address, strip_invisible, Detection, EmailCandidate, SourceCategory,
};
use crate::extract::{ExtractionError, PageContent};
use crate::validate::check_syntax;
use regex::Regex;
use std::collections::{HashSet, VecDeque};
use std::sync::LazyLock;

static EMAIL_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[a-z0-9._%+-]+@(?:[a-z0-9-]+\.)+[a-z]{2,24}\b").expect("email token pattern")
});

static OBFUSCATED_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b([a-z0-9._%+-]+)\s*[\[\(\{]\s*at\s*[\]\)\}]\s*([a-z0-9-]+(?:(?:\s*[\[\(\{]\s*dot\s*[\]\)\}]\s*|\.)[a-z0-9-]+)+)",
    )
    .expect("obfuscated token pattern")
});

static OBFUSCATED_DOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*[\[\(\{]\s*dot\s*[\]\)\}]\s*").expect("obfuscated dot pattern")
});

/// Trailing labels that mark a file name rather than a mail domain
const ASSET_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "webp", "bmp", "ico", "tiff", "css", "js",
];

/// Local parts used in form hints and documentation
const PLACEHOLDER_LOCALS: &[&str] = &[
    "your",
    "youremail",
    "yourname",
    "your.name",
    "email",
    "name",
    "user",
    "username",
    "someone",
    "firstname.lastname",
    "first.last",
    "john.doe",
    "jane.doe",
];

const PLACEHOLDER_DOMAINS: &[&str] = &[
    "domain.com",
    "yourdomain.com",
    "yourcompany.com",
    "company.com",
    "email.com",
    "sentry.io",
];

/// Lazy sequence of candidates for one page
///
/// Each normalized address is yielded at most once per page; the first
/// sighting in document order wins.
#[derive(Debug)]
pub struct Candidates {
    source_page: String,
    segments: std::vec::IntoIter<Segment>,
    pending: VecDeque<EmailCandidate>,
    seen: HashSet<String>,
}

impl Iterator for Candidates {
    type Item = EmailCandidate;

    fn next(&mut self) -> Option<EmailCandidate> {
        loop {
            if let Some(candidate) = self.pending.pop_front() {
                return Some(candidate);
            }

            let segment = self.segments.next()?;
            for candidate in scan_segment(&segment, &self.source_page) {
                if self.seen.insert(candidate.address.clone()) {
                    self.pending.push_back(candidate);
                }
            }
        }
    }
}

/// Candidates and outgoing links of one page, from a single parse
#[derive(Debug)]
pub struct PageScan {
    pub candidates: Candidates,
    /// Absolute links of an HTML page; empty for other content
    pub links: Vec<String>,
}

/// Scans a page for email candidates and links
///
/// # Returns
///
/// * `Ok(PageScan)` - Lazy, finite candidate sequence (possibly empty) and the page links
/// * `Err(ExtractionError)` - The content cannot be scanned (empty, binary, not text)
pub fn scan_page(page: &PageContent) -> Result<PageScan, ExtractionError> {
    if page.body.trim().is_empty() {
        return Err(ExtractionError::Empty);
    }

    if page.body.contains('\0') {
        return Err(ExtractionError::Binary);
    }

    let (segments, links) = match page.content_type.as_deref().map(media_type) {
        Some("text/plain") => {
            let category = SourceCategory::from_keywords(page.url.path())
                .unwrap_or(SourceCategory::PageContent);
            let text = Segment::Text {
                text: page.body.clone(),
                category,
            };
            (vec![text], Vec::new())
        }
        None | Some("text/html") | Some("application/xhtml+xml") => {
            let parsed = parse_html(&page.body, &page.url);
            (parsed.segments, parsed.links)
        }
        Some(other) => return Err(ExtractionError::UnsupportedContent(other.to_string())),
    };

    Ok(PageScan {
        candidates: Candidates {
            source_page: page.url.to_string(),
            segments: segments.into_iter(),
            pending: VecDeque::new(),
            seen: HashSet::new(),
        },
        links,
    })
}

/// Produces the email candidates found on a page
///
/// # Example
///
/// ```
/// use dovepeak::extract::{extract_candidates, PageContent};
/// use url::Url;
///
/// let page = PageContent::new(
///     Url::parse("https://example.org/contact").unwrap(),
///     "Contact us: info@example.org or call 555-1234".to_string(),
///     Some("text/plain".to_string()),
/// );
/// let found: Vec<_> = extract_candidates(&page).unwrap().collect();
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].address, "info@example.org");
/// ```
pub fn extract_candidates(page: &PageContent) -> Result<Candidates, ExtractionError> {
    scan_page(page).map(|scan| scan.candidates)
}

fn media_type(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or("").trim()
}

fn scan_segment(segment: &Segment, source_page: &str) -> Vec<EmailCandidate> {
    match segment {
        Segment::Mailto { target, category } => {
            build_candidate(target, source_page, *category, Detection::MailtoLink)
                .into_iter()
                .collect()
        }
        Segment::Text { text, category } => {
            let text = strip_invisible(text);
            let mut found: Vec<(usize, EmailCandidate)> = EMAIL_TOKEN
                .find_iter(&text)
                .filter_map(|m| {
                    build_candidate(m.as_str(), source_page, *category, Detection::PlainText)
                        .map(|c| (m.start(), c))
                })
                .collect();

            for caps in OBFUSCATED_TOKEN.captures_iter(&text) {
                let (Some(whole), Some(local), Some(host)) = (caps.get(0), caps.get(1), caps.get(2))
                else {
                    continue;
                };
                let host = OBFUSCATED_DOT.replace_all(host.as_str(), ".");
                let host: String = host.chars().filter(|c| !c.is_whitespace()).collect();
                let decoded = format!("{}@{}", local.as_str(), host);
                if let Some(candidate) =
                    build_candidate(&decoded, source_page, *category, Detection::Obfuscated)
                {
                    found.push((whole.start(), candidate));
                }
            }

            found.sort_by_key(|(start, _)| *start);
            found.into_iter().map(|(_, c)| c).collect()
        }
    }
}

fn build_candidate(
    raw: &str,
    source_page: &str,
    category: SourceCategory,
    detection: Detection,
) -> Option<EmailCandidate> {
    let address = normalize_address(raw);
    if !is_plausible_address(&address) {
        tracing::trace!("Rejected token {:?} on {}", raw, source_page);
        return None;
    }
    let (_, domain) = split_address(&address)?;

    Some(EmailCandidate {
        raw: raw.trim().to_string(),
        domain: domain.to_string(),
        address,
        source_page: source_page.to_string(),
        category,
        detection,
    })
}

/// Grammar check plus the rejections specific to scraped text
fn is_plausible_address(address: &str) -> bool {
    if check_syntax(address).is_err() {
        return false;
    }
    let Some((local, domain)) = split_address(address) else {
        return false;
    };

    let tld = domain.rsplit('.').next().unwrap_or("");
    if ASSET_EXTENSIONS.contains(&tld) {
        return false;
    }

    !PLACEHOLDER_LOCALS.contains(&local) && !PLACEHOLDER_DOMAINS.contains(&domain)
}
