//! Email address shape checks shared by detection and row classification.
use regex::Regex;
use std::sync::LazyLock;

/// `local-part@domain.tld` with no whitespace and a single `@`.
pub const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("valid email pattern"));

/// Whether `value` (already trimmed) looks like an email address.
pub fn is_email_shaped(value: &str) -> bool {
    EMAIL_REGEX.is_match(value)
}

/// Domain part of an address, if it has one.
pub fn domain_of(address: &str) -> Option<&str> {
    address
        .split_once('@')
        .map(|(_, domain)| domain)
        .filter(|domain| !domain.is_empty())
}
