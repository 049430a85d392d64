//! Typed numeric tokenizer for the consistency guard.
//!
//! Extracts `{date, currency, percentage, integer}` tokens from free
//! text and normalizes each to a canonical form so "August 15, 2026"
//! in an answer matches "2026-08-15" in evidence. Slash dates are read
//! day-first (DD/MM/YYYY). Plain integers shorter than four digits are
//! ignored so slot-like values ("semester 3") don't false-positive.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericKind {
    Date,
    Currency,
    Percentage,
    Integer,
}

/// A numeric token found in text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericToken {
    pub kind: NumericKind,
    /// Token exactly as it appeared.
    pub raw: String,
    /// Canonical form used for cross-text matching.
    pub normalized: String,
}

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap());

static MONTH_FIRST_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|jun(?:e)?|jul(?:y)?|aug(?:ust)?|sep(?:tember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\s+(\d{1,2}),?\s+(\d{4})\b",
    )
    .unwrap()
});

static DAY_FIRST_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,2})\s+(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|jun(?:e)?|jul(?:y)?|aug(?:ust)?|sep(?:tember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\s+(\d{4})\b",
    )
    .unwrap()
});

static SLASH_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").unwrap());

static CURRENCY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:₹|Rs\.?\s?|\$)\s?(\d{1,3}(?:,\d{3})*|\d+)(\.\d{1,2})?").unwrap()
});

static CURRENCY_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,3}(?:,\d{3})*|\d+)\s?(?:rupees|dollars|inr|usd)\b").unwrap()
});

static PERCENTAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+(?:\.\d+)?)\s?%").unwrap());

static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{4,}\b").unwrap());

fn month_number(name: &str) -> Option<u32> {
    let n = match name.to_lowercase().as_str() {
        m if m.starts_with("jan") => 1,
        m if m.starts_with("feb") => 2,
        m if m.starts_with("mar") => 3,
        m if m.starts_with("apr") => 4,
        m if m.starts_with("may") => 5,
        m if m.starts_with("jun") => 6,
        m if m.starts_with("jul") => 7,
        m if m.starts_with("aug") => 8,
        m if m.starts_with("sep") => 9,
        m if m.starts_with("oct") => 10,
        m if m.starts_with("nov") => 11,
        m if m.starts_with("dec") => 12,
        _ => return None,
    };
    Some(n)
}

fn iso(year: i32, month: u32, day: u32) -> Option<String> {
    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.format("%Y-%m-%d").to_string())
}

fn overlaps(spans: &[(usize, usize)], start: usize, end: usize) -> bool {
    spans.iter().any(|&(s, e)| start < e && s < end)
}

/// Extract all typed numeric tokens from text. Earlier categories
/// (dates, currency, percentages) claim their spans so the plain
/// integer pass never re-reports their digits.
pub fn extract_tokens(text: &str) -> Vec<NumericToken> {
    let mut tokens = Vec::new();
    let mut spans: Vec<(usize, usize)> = Vec::new();

    for caps in ISO_DATE.captures_iter(text) {
        let m = caps.get(0).unwrap();
        let (y, mo, d) = (
            caps[1].parse().unwrap_or(0),
            caps[2].parse().unwrap_or(0),
            caps[3].parse().unwrap_or(0),
        );
        if let Some(normalized) = iso(y, mo, d) {
            spans.push((m.start(), m.end()));
            tokens.push(NumericToken {
                kind: NumericKind::Date,
                raw: m.as_str().to_string(),
                normalized,
            });
        }
    }
    for caps in MONTH_FIRST_DATE.captures_iter(text) {
        let m = caps.get(0).unwrap();
        let month = month_number(&caps[1]);
        let day: u32 = caps[2].parse().unwrap_or(0);
        let year: i32 = caps[3].parse().unwrap_or(0);
        if let Some(normalized) = month.and_then(|mo| iso(year, mo, day)) {
            spans.push((m.start(), m.end()));
            tokens.push(NumericToken {
                kind: NumericKind::Date,
                raw: m.as_str().to_string(),
                normalized,
            });
        }
    }
    for caps in DAY_FIRST_DATE.captures_iter(text) {
        let m = caps.get(0).unwrap();
        if overlaps(&spans, m.start(), m.end()) {
            continue;
        }
        let day: u32 = caps[1].parse().unwrap_or(0);
        let month = month_number(&caps[2]);
        let year: i32 = caps[3].parse().unwrap_or(0);
        if let Some(normalized) = month.and_then(|mo| iso(year, mo, day)) {
            spans.push((m.start(), m.end()));
            tokens.push(NumericToken {
                kind: NumericKind::Date,
                raw: m.as_str().to_string(),
                normalized,
            });
        }
    }
    for caps in SLASH_DATE.captures_iter(text) {
        let m = caps.get(0).unwrap();
        if overlaps(&spans, m.start(), m.end()) {
            continue;
        }
        // Day-first convention.
        let day: u32 = caps[1].parse().unwrap_or(0);
        let month: u32 = caps[2].parse().unwrap_or(0);
        let year: i32 = caps[3].parse().unwrap_or(0);
        if let Some(normalized) = iso(year, month, day) {
            spans.push((m.start(), m.end()));
            tokens.push(NumericToken {
                kind: NumericKind::Date,
                raw: m.as_str().to_string(),
                normalized,
            });
        }
    }

    for caps in CURRENCY.captures_iter(text).chain(CURRENCY_SUFFIX.captures_iter(text)) {
        let m = caps.get(0).unwrap();
        if overlaps(&spans, m.start(), m.end()) {
            continue;
        }
        let mut normalized = caps[1].replace(',', "");
        if let Some(frac) = caps.get(2) {
            normalized.push_str(frac.as_str());
        }
        spans.push((m.start(), m.end()));
        tokens.push(NumericToken {
            kind: NumericKind::Currency,
            raw: m.as_str().to_string(),
            normalized,
        });
    }

    for caps in PERCENTAGE.captures_iter(text) {
        let m = caps.get(0).unwrap();
        if overlaps(&spans, m.start(), m.end()) {
            continue;
        }
        spans.push((m.start(), m.end()));
        tokens.push(NumericToken {
            kind: NumericKind::Percentage,
            raw: m.as_str().to_string(),
            normalized: format!("{}%", &caps[1]),
        });
    }

    for m in INTEGER.find_iter(text) {
        if overlaps(&spans, m.start(), m.end()) {
            continue;
        }
        tokens.push(NumericToken {
            kind: NumericKind::Integer,
            raw: m.as_str().to_string(),
            normalized: m.as_str().to_string(),
        });
    }

    tokens
}

/// Tokens in `answer` whose normalized form appears in no evidence
/// text. Raw verbatim occurrence in evidence also counts as support.
pub fn unsupported_tokens(answer: &str, evidence_texts: &[String]) -> Vec<NumericToken> {
    let answer_tokens = extract_tokens(answer);
    if answer_tokens.is_empty() {
        return Vec::new();
    }

    let evidence_normals: BTreeSet<String> = evidence_texts
        .iter()
        .flat_map(|text| extract_tokens(text))
        .map(|t| t.normalized)
        .collect();

    answer_tokens
        .into_iter()
        .filter(|token| {
            !evidence_normals.contains(&token.normalized)
                && !evidence_texts.iter().any(|e| e.contains(&token.raw))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_and_normalizes_date_shapes() {
        let tokens = extract_tokens("Due August 15, 2026 or 15 August 2026 or 2026-08-15.");
        assert_eq!(tokens.len(), 3);
        assert!(tokens.iter().all(|t| t.kind == NumericKind::Date));
        assert!(tokens.iter().all(|t| t.normalized == "2026-08-15"));
    }

    #[test]
    fn slash_dates_are_day_first() {
        let tokens = extract_tokens("submit by 05/01/2026");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].normalized, "2026-01-05");
    }

    #[test]
    fn extracts_currency_with_grouping() {
        let tokens = extract_tokens("The hostel fee is ₹45,500 per semester.");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, NumericKind::Currency);
        assert_eq!(tokens[0].normalized, "45500");
    }

    #[test]
    fn extracts_percentage() {
        let tokens = extract_tokens("A late fee of 5% applies.");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, NumericKind::Percentage);
        assert_eq!(tokens[0].normalized, "5%");
    }

    #[test]
    fn small_integers_are_ignored() {
        assert!(extract_tokens("semester 3 at the main campus").is_empty());
        let tokens = extract_tokens("roll number 20260042");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, NumericKind::Integer);
    }

    #[test]
    fn date_digits_not_double_counted_as_integers() {
        let tokens = extract_tokens("deadline 2026-08-15");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, NumericKind::Date);
    }

    #[test]
    fn normalized_date_matches_across_formats() {
        let evidence = vec!["Fees must be paid by 2026-08-15.".to_string()];
        let missing = unsupported_tokens("The deadline is August 15, 2026.", &evidence);
        assert!(missing.is_empty());
    }

    #[test]
    fn unsupported_amount_is_reported() {
        let evidence = vec!["The fee is ₹45,500.".to_string()];
        let missing = unsupported_tokens("The fee is ₹52,000.", &evidence);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].normalized, "52000");
    }

    #[test]
    fn no_numbers_means_nothing_unsupported() {
        assert!(unsupported_tokens("Contact the registrar office.", &[]).is_empty());
    }
}
