use url::Url;

/// Checks whether a URL path mentions one of the configured link patterns
///
/// Matching is a case-insensitive substring test on the path, so the
/// pattern `contact` matches `/contact`, `/contact-us` and `/en/Contact.html`.
/// The site root never matches; it is always crawled as the seed page.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use dovepeak::url::matches_link_pattern;
///
/// let patterns = vec!["contact".to_string(), "staff".to_string()];
/// let url = Url::parse("https://example.com/Contact-Us").unwrap();
/// assert!(matches_link_pattern(&url, &patterns));
///
/// let url = Url::parse("https://example.com/blog/post-1").unwrap();
/// assert!(!matches_link_pattern(&url, &patterns));
/// ```
pub fn matches_link_pattern(url: &Url, patterns: &[String]) -> bool {
    let path = url.path().to_lowercase();
    if path == "/" {
        return false;
    }

    patterns
        .iter()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .any(|p| path.contains(&p))
}
