//! Utility functions for domain validation and batch input preparation.

use crate::error::LookupError;
use regex::Regex;
use std::collections::HashSet;

lazy_static::lazy_static! {
    // One leading label (1-63 chars, no edge hyphens), then one or more
    // alphabetic suffixes of at least two letters.
    static ref DOMAIN_RE: Regex =
        Regex::new(r"^[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(\.[a-zA-Z]{2,})+$")
            .expect("domain pattern is valid");
}

/// Check whether a string is a hostname-shaped domain.
///
/// No network access and no trimming: `" abc.com"` is invalid.
pub fn is_valid_domain(domain: &str) -> bool {
    DOMAIN_RE.is_match(domain)
}

/// Validate a domain name, explaining why it was rejected.
///
/// # Returns
///
/// `Ok(())` if valid, `Err(LookupError::InvalidDomain)` otherwise.
pub fn validate_domain(domain: &str) -> Result<(), LookupError> {
    if domain.is_empty() {
        return Err(LookupError::invalid_domain(
            domain,
            "Domain name cannot be empty",
        ));
    }

    if !is_valid_domain(domain) {
        return Err(LookupError::invalid_domain(
            domain,
            "Expected a label of letters, digits or hyphens followed by alphabetic suffixes",
        ));
    }

    Ok(())
}

/// Combine prefixes with a suffix into full domain names.
///
/// Leading dots on the suffix are ignored, so `"com"` and `".com"` behave the
/// same. Blank prefixes are skipped; no validation happens here, invalid
/// results are classified later by the checker.
pub fn build_domains(prefixes: &[String], suffix: &str) -> Vec<String> {
    let suffix = suffix.trim().trim_start_matches('.');

    prefixes
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| format!("{}.{}", p, suffix))
        .collect()
}

/// Parse prefix lines as found in a prefix file or on stdin.
///
/// Lines are trimmed; empty lines and `#` comments (whole-line or trailing)
/// are dropped.
pub fn parse_prefix_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Remove duplicate domains, keeping the first occurrence.
pub fn dedup_domains(domains: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    domains
        .iter()
        .filter(|d| seen.insert(d.as_str()))
        .cloned()
        .collect()
}
