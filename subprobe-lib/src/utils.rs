//! Utility functions for domain name handling.
//!
//! This module contains helpers for validating the scan target and building
//! the fully qualified names workers query.

use crate::error::ScanError;

/// Normalize and validate the target domain of a scan.
///
/// Trims whitespace, lowercases, and strips a single trailing dot, then checks
/// basic label syntax. Single-label targets (e.g. an internal zone like
/// `corp`) are accepted.
///
/// # Returns
///
/// The normalized domain, or `ScanError::InvalidDomain`.
pub fn normalize_domain(domain: &str) -> Result<String, ScanError> {
    let trimmed = domain.trim();
    let normalized = trimmed
        .strip_suffix('.')
        .unwrap_or(trimmed)
        .to_ascii_lowercase();

    if normalized.is_empty() {
        return Err(ScanError::invalid_domain(
            domain,
            "Domain name cannot be empty",
        ));
    }

    if normalized.len() > 253 {
        return Err(ScanError::invalid_domain(
            domain,
            "Domain name is longer than 253 characters",
        ));
    }

    for label in normalized.split('.') {
        if !is_valid_label(label) {
            return Err(ScanError::invalid_domain(
                domain,
                format!("Invalid label '{}'", label),
            ));
        }
    }

    Ok(normalized)
}

/// Build `<candidate>.<domain>`.
pub fn join_fqdn(candidate: &str, domain: &str) -> String {
    format!("{}.{}", candidate, domain)
}

/// Validate one DNS label: 1-63 characters, alphanumerics, hyphens and
/// underscores, no leading or trailing hyphen.
fn is_valid_label(label: &str) -> bool {
    if label.is_empty() || label.len() > 63 {
        return false;
    }

    if label.starts_with('-') || label.ends_with('-') {
        return false;
    }

    label
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain("example.com").unwrap(), "example.com");
        assert_eq!(normalize_domain(" Example.COM. ").unwrap(), "example.com");
        assert_eq!(normalize_domain("corp").unwrap(), "corp");
        assert_eq!(normalize_domain("test.co.uk").unwrap(), "test.co.uk");
    }

    #[test]
    fn test_normalize_domain_rejects_invalid() {
        assert!(normalize_domain("").is_err());
        assert!(normalize_domain(".").is_err());
        assert!(normalize_domain("-example.com").is_err());
        assert!(normalize_domain("example..com").is_err());
        assert!(normalize_domain("exa mple.com").is_err());
        assert!(normalize_domain(&format!("{}.com", "a".repeat(64))).is_err());
    }

    #[test]
    fn test_join_fqdn() {
        assert_eq!(join_fqdn("www", "example.com"), "www.example.com");
        assert_eq!(join_fqdn("a.b", "example.com"), "a.b.example.com");
    }

    #[test]
    fn test_is_valid_label() {
        assert!(is_valid_label("www"));
        assert!(is_valid_label("_dmarc"));
        assert!(is_valid_label("dev-1"));

        assert!(!is_valid_label(""));
        assert!(!is_valid_label("-dev"));
        assert!(!is_valid_label("dev-"));
        assert!(!is_valid_label("dev.1"));
    }
}
