use crate::url::normalize_url;
use crate::UrlError;
use url::Url;

/// Extracts the crawl domain key from a URL
///
/// The host is lowercased and a leading `www.` removed, so `www.example.com`
/// and `example.com` share politeness and page budgets. An explicit
/// non-default port is kept as part of the key.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use dovepeak::url::extract_domain;
///
/// let url = Url::parse("https://WWW.Example.com/contact").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(extract_domain(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").map(str::to_string).unwrap_or(host);

    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Turns a seed (bare domain or URL) into the base URL of its crawl
///
/// Bare domains get `https://`. The host must look like a domain name or
/// an IP address: at least one dot and no empty labels.
pub fn seed_url(seed: &str) -> Result<Url, UrlError> {
    let trimmed = seed.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Parse("seed is empty".to_string()));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = normalize_url(&with_scheme)?;
    let host = url.host_str().ok_or(UrlError::MissingDomain)?;

    if !host.contains('.') || host.starts_with('.') || host.ends_with('.') || host.contains("..")
    {
        return Err(UrlError::Malformed(format!(
            "'{}' does not look like a domain",
            host
        )));
    }

    Ok(url)
}

/// Returns true if both URLs belong to the same crawl domain
pub fn is_same_domain(a: &Url, b: &Url) -> bool {
    match (extract_domain(a), extract_domain(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_domain() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_strips_www() {
        let url = Url::parse("https://www.cityhospital.net/staff").unwrap();
        assert_eq!(extract_domain(&url), Some("cityhospital.net".to_string()));
    }

    #[test]
    fn test_extract_keeps_subdomain() {
        let url = Url::parse("https://careers.medicenter.com/").unwrap();
        assert_eq!(
            extract_domain(&url),
            Some("careers.medicenter.com".to_string())
        );
    }

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("http://127.0.0.1:3000/contact").unwrap();
        assert_eq!(extract_domain(&url), Some("127.0.0.1:3000".to_string()));
    }

    #[test]
    fn test_seed_url_bare_domain() {
        let url = seed_url(" stmaryshospital.com ").unwrap();
        assert_eq!(url.as_str(), "https://stmaryshospital.com/");
    }

    #[test]
    fn test_seed_url_full_url() {
        let url = seed_url("http://generalhospital.org/about/").unwrap();
        assert_eq!(url.as_str(), "http://generalhospital.org/about");
    }

    #[test]
    fn test_seed_url_invalid() {
        assert!(seed_url("").is_err());
        assert!(seed_url("localhost").is_err());
        assert!(seed_url("ftp://example.com").is_err());
        assert!(seed_url("not a domain").is_err());
    }

    #[test]
    fn test_is_same_domain() {
        let a = Url::parse("https://www.example.com/").unwrap();
        let b = Url::parse("https://example.com/contact").unwrap();
        let c = Url::parse("https://other.com/contact").unwrap();
        assert!(is_same_domain(&a, &b));
        assert!(!is_same_domain(&a, &c));
    }
}
