/// Characters that render as nothing but break string equality
const INVISIBLE: &[char] = &[
    '\u{200B}', // zero width space
    '\u{200C}', // zero width non-joiner
    '\u{200D}', // zero width joiner
    '\u{2060}', // word joiner
    '\u{FEFF}', // byte order mark
    '\u{00AD}', // soft hyphen
];

/// Removes invisible formatting characters from `text`
pub fn strip_invisible(text: &str) -> String {
    text.chars().filter(|c| !INVISIBLE.contains(c)).collect()
}

/// Canonical form of an address: invisible characters removed, trimmed, lowercased
///
/// Two sightings are the same address exactly when their normalized forms are equal.
///
/// # Examples
///
/// ```
/// use dovepeak::email::normalize_address;
///
/// assert_eq!(normalize_address(" Admin@Example.ORG\u{200B} "), "admin@example.org");
/// ```
pub fn normalize_address(raw: &str) -> String {
    strip_invisible(raw).trim().to_lowercase()
}

/// Splits an address at its last `@` into local part and domain
pub fn split_address(address: &str) -> Option<(&str, &str)> {
    let (local, domain) = address.rsplit_once('@')?;
    if local.is_empty() || domain.is_empty() {
        return None;
    }
    Some((local, domain))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_case_and_whitespace() {
        assert_eq!(normalize_address("  Info@StMarys.COM\n"), "info@stmarys.com");
    }

    #[test]
    fn test_normalize_strips_invisible() {
        assert_eq!(
            normalize_address("con\u{200D}tact@ex\u{00AD}ample.org\u{FEFF}"),
            "contact@example.org"
        );
    }

    #[test]
    fn test_equivalent_sightings_compare_equal() {
        assert_eq!(
            normalize_address("Admin@Example.ORG"),
            normalize_address("admin@example.org")
        );
    }

    #[test]
    fn test_split_address() {
        assert_eq!(
            split_address("jane.doe@example.org"),
            Some(("jane.doe", "example.org"))
        );
        assert_eq!(split_address("no-at-sign"), None);
        assert_eq!(split_address("@example.org"), None);
        assert_eq!(split_address("user@"), None);
    }
}
