//! Built-in pattern classifier.
//!
//! Deterministic keyword matching over normalized text, with slot
//! extraction driven by the registry domains. Good enough for known
//! query classes; anything it cannot place comes back with no intent
//! and the router degrades safely. A model-backed classifier can
//! replace it behind the same trait.

use crate::collaborators::{Classification, Classifier};
use async_trait::async_trait;
use disha_shared::error::DishaError;
use disha_shared::lang::LanguageTag;
use disha_shared::slots::SlotRegistry;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static SEMESTER_AFTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bsem(?:ester)?\s*([1-8])\b").unwrap());
static SEMESTER_BEFORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([1-8])(?:st|nd|rd|th)?\s+sem(?:ester)?\b").unwrap());

pub struct PatternClassifier {
    registry: SlotRegistry,
}

impl PatternClassifier {
    pub fn new(registry: SlotRegistry) -> Self {
        Self { registry }
    }

    fn normalize(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.to_lowercase().chars() {
            match c {
                '?' | '!' | '.' | ',' | ';' | ':' | '"' => out.push(' '),
                _ => out.push(c),
            }
        }
        out.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Map normalized text to a known intent. Specific classes are
    /// checked before the generic fee class so "hostel fee due" does
    /// not land on `fee_deadline`.
    fn match_intent(q: &str) -> Option<&'static str> {
        if q.contains("scholarship") {
            return Some("scholarship_form_deadline");
        }
        if q.contains("hostel") {
            return Some("hostel_fee_due");
        }
        if q.contains("timetable") || q.contains("time table") {
            return Some("timetable_release");
        }
        if q.contains("exam") && (q.contains("form") || q.contains("deadline") || q.contains("last date")) {
            return Some("exam_form_deadline");
        }
        if (q.contains("fee") || q.contains("fees") || q.contains("tuition"))
            && (q.contains("deadline")
                || q.contains("due")
                || q.contains("last date")
                || q.contains("pay"))
        {
            return Some("fee_deadline");
        }
        None
    }

    fn extract_slots(&self, q: &str) -> BTreeMap<String, String> {
        let mut slots = BTreeMap::new();

        for slot in ["program", "campus", "scholarship_type", "year"] {
            if let Some(value) = self.registry.match_value(slot, q) {
                slots.insert(slot.to_string(), value.to_string());
            }
        }

        let semester = SEMESTER_AFTER
            .captures(q)
            .or_else(|| SEMESTER_BEFORE.captures(q))
            .map(|caps| caps[1].to_string());
        if let Some(sem) = semester {
            slots.insert("semester".to_string(), sem);
        }

        slots
    }
}

#[async_trait]
impl Classifier for PatternClassifier {
    async fn classify(&self, text: &str, _lang: LanguageTag) -> Result<Classification, DishaError> {
        let q = Self::normalize(text);
        let slots = self.extract_slots(&q);

        let Some(intent) = Self::match_intent(&q) else {
            return Ok(Classification {
                intent: None,
                slots,
                confidence: 0.0,
            });
        };

        // Keyword hit carries 0.7 of the confidence, slot fill the
        // remaining 0.3.
        let required = self.registry.required(intent);
        let slot_ratio = if required.is_empty() {
            1.0
        } else {
            required.iter().filter(|s| slots.contains_key(**s)).count() as f64
                / required.len() as f64
        };
        let confidence = 0.9 * 0.7 + slot_ratio * 0.3;

        Ok(Classification {
            intent: Some(intent.to_string()),
            slots,
            confidence,
        })
    }
}
