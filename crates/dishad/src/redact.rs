//! PII redaction rules.
//!
//! Removes personally identifying patterns from user text before it
//! is persisted, logged, or handed to the ticket store. Deterministic
//! replacement with fixed placeholder tokens.

use regex::Regex;
use std::sync::LazyLock;

/// Patterns that should be redacted
static REDACTION_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        // Email addresses
        (
            Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap(),
            "[REDACTED EMAIL]",
        ),
        // SSN-style ids (checked before phone so 123-45-6789 is not
        // half-eaten by the phone pattern)
        (
            Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap(),
            "[REDACTED SSN]",
        ),
        // Phone numbers, optional country code and separators
        (
            Regex::new(r"\b(?:\+\d{1,2}[\s.-]?)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}\b").unwrap(),
            "[REDACTED PHONE]",
        ),
        // Card-like 16-digit groups
        (
            Regex::new(r"\b(?:\d{4}[- ]?){3}\d{4}\b").unwrap(),
            "[REDACTED CARD]",
        ),
    ]
});

/// Redact PII patterns from text
pub fn redact(text: &str) -> String {
    let mut result = text.to_string();

    for (pattern, replacement) in REDACTION_PATTERNS.iter() {
        result = pattern.replace_all(&result, *replacement).to_string();
    }

    result
}

/// Check if text contains redactable patterns
pub fn contains_pii(text: &str) -> bool {
    REDACTION_PATTERNS
        .iter()
        .any(|(pattern, _)| pattern.is_match(text))
}
