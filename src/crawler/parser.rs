//! HTML parsing for fetched pages
//!
//! A page is parsed once. The result carries the links used for page
//! discovery and the visible text segments scanned for addresses. Which
//! links are crawled is decided afterwards by `url::discover_links`.

use crate::email::SourceCategory;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;
use url::Url;

static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));
static CANONICAL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("link[rel='canonical'][href]").expect("valid selector"));
static HEADING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, title").expect("valid selector"));

/// Elements whose text never reaches a reader
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Scannable piece of a page, in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text {
        text: String,
        category: SourceCategory,
    },
    /// Address part of a `mailto:` link
    Mailto {
        target: String,
        category: SourceCategory,
    },
}

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// All links found on the page (absolute URLs)
    pub links: Vec<String>,

    pub segments: Vec<Segment>,
}

/// Parses HTML content into links and text segments
///
/// The page category comes from the URL path, then from the title and
/// top-level headings. Text inside `<footer>` is tagged as footer.
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs and fragment-only links
///
/// # Example
///
/// ```
/// use dovepeak::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/contact">Contact</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.links, vec!["https://example.com/contact".to_string()]);
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    let anchors = document
        .select(&ANCHOR)
        .filter(|element| element.value().attr("download").is_none());
    let links = anchors
        .chain(document.select(&CANONICAL))
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect();

    let category = SourceCategory::from_keywords(base_url.path())
        .or_else(|| heading_category(&document))
        .unwrap_or(SourceCategory::PageContent);

    let mut walker = SegmentWalker {
        segments: Vec::new(),
        buffer: Vec::new(),
        buffer_category: category,
    };
    walker.walk(document.root_element(), category);
    walker.flush();

    ParsedPage {
        links,
        segments: walker.segments,
    }
}

/// Resolves a link href to an absolute HTTP(S) URL
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(absolute_url.to_string()),
        _ => None,
    }
}

fn heading_category(document: &Html) -> Option<SourceCategory> {
    document
        .select(&HEADING)
        .map(|el| el.text().collect::<String>())
        .find_map(|text| SourceCategory::from_keywords(&text))
}

struct SegmentWalker {
    segments: Vec<Segment>,
    buffer: Vec<String>,
    buffer_category: SourceCategory,
}

impl SegmentWalker {
    fn walk(&mut self, element: ElementRef<'_>, category: SourceCategory) {
        let name = element.value().name();
        if HIDDEN_ELEMENTS.contains(&name) {
            return;
        }

        let category = if name == "footer" {
            SourceCategory::Footer
        } else {
            category
        };

        if name == "a" {
            if let Some(target) = element.value().attr("href").and_then(mailto_target) {
                self.flush();
                self.segments.push(Segment::Mailto { target, category });
            }
        }

        for child in element.children() {
            if let Some(child_element) = ElementRef::wrap(child) {
                self.walk(child_element, category);
            } else if let Node::Text(text) = child.value() {
                self.push_text(text, category);
            }
        }
    }

    fn push_text(&mut self, text: &str, category: SourceCategory) {
        if category != self.buffer_category {
            self.flush();
            self.buffer_category = category;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            self.buffer.push(trimmed.to_string());
        }
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        self.segments.push(Segment::Text {
            text: self.buffer.join(" "),
            category: self.buffer_category,
        });
        self.buffer.clear();
    }
}

/// Address part of a `mailto:` href, without query and percent-encoding
fn mailto_target(href: &str) -> Option<String> {
    let href = href.trim();
    let scheme = href.get(..7)?;
    if !scheme.eq_ignore_ascii_case("mailto:") {
        return None;
    }
    let rest = href.get(7..)?;
    let address = rest.split('?').next().unwrap_or("");
    // only the first recipient of a list
    let address = address.split(',').next().unwrap_or("").trim();
    let decoded = address.replace("%40", "@").replace("%20", "");
    if decoded.is_empty() {
        None
    } else {
        Some(decoded)
    }
}
