//! Static slot registry: per-intent required/optional slots and the
//! enumerated value domains used to render disambiguation chips.
//!
//! The registry is fixed configuration, not learned state. Every slot
//! the pipeline can ask about has a closed, ordered domain of
//! canonical values so a clarification turn can always offer chips.

use std::collections::BTreeMap;

/// Per-intent slot requirements.
#[derive(Debug, Clone)]
pub struct SlotSpec {
    pub required: Vec<&'static str>,
    pub optional: Vec<&'static str>,
}

/// Registry of intents, their slot specs, and slot value domains.
#[derive(Debug, Clone)]
pub struct SlotRegistry {
    specs: BTreeMap<&'static str, SlotSpec>,
    domains: BTreeMap<&'static str, Vec<&'static str>>,
}

impl SlotRegistry {
    /// The built-in campus-policy intent table.
    pub fn builtin() -> Self {
        let mut specs = BTreeMap::new();
        specs.insert(
            "fee_deadline",
            SlotSpec {
                required: vec!["program", "semester", "campus"],
                optional: vec!["year"],
            },
        );
        specs.insert(
            "scholarship_form_deadline",
            SlotSpec {
                required: vec!["program", "scholarship_type"],
                optional: vec!["year"],
            },
        );
        specs.insert(
            "timetable_release",
            SlotSpec {
                required: vec!["program", "semester"],
                optional: vec![],
            },
        );
        specs.insert(
            "hostel_fee_due",
            SlotSpec {
                required: vec!["campus", "semester"],
                optional: vec![],
            },
        );
        specs.insert(
            "exam_form_deadline",
            SlotSpec {
                required: vec!["program", "semester"],
                optional: vec!["year"],
            },
        );

        let mut domains = BTreeMap::new();
        domains.insert("program", vec!["BTech", "BBA", "MBA", "MTech"]);
        domains.insert("semester", vec!["1", "2", "3", "4", "5", "6", "7", "8"]);
        domains.insert("campus", vec!["main", "city", "online"]);
        domains.insert("scholarship_type", vec!["merit", "need_based", "sports"]);
        domains.insert("year", vec!["2025", "2026", "2027"]);

        Self { specs, domains }
    }

    pub fn known_intent(&self, intent: &str) -> bool {
        self.specs.contains_key(intent)
    }

    pub fn intents(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.specs.keys().copied()
    }

    /// Required slot names for an intent, empty for unknown intents.
    pub fn required(&self, intent: &str) -> &[&'static str] {
        self.specs
            .get(intent)
            .map(|s| s.required.as_slice())
            .unwrap_or(&[])
    }

    pub fn optional(&self, intent: &str) -> &[&'static str] {
        self.specs
            .get(intent)
            .map(|s| s.optional.as_slice())
            .unwrap_or(&[])
    }

    /// Ordered domain of canonical values for a slot.
    pub fn domain(&self, slot: &str) -> &[&'static str] {
        self.domains.get(slot).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Required slots not yet present in `collected`.
    pub fn missing(&self, intent: &str, collected: &BTreeMap<String, String>) -> Vec<&'static str> {
        self.required(intent)
            .iter()
            .filter(|slot| !collected.contains_key(**slot))
            .copied()
            .collect()
    }

    /// Chips for a set of missing slots: slot name mapped to its
    /// full canonical domain, in domain order.
    pub fn chips_for(&self, missing: &[&'static str]) -> BTreeMap<String, Vec<String>> {
        missing
            .iter()
            .map(|slot| {
                (
                    slot.to_string(),
                    self.domain(slot).iter().map(|v| v.to_string()).collect(),
                )
            })
            .collect()
    }

    /// Find the first canonical domain value mentioned in `text` as a
    /// whole word, case-insensitive. Token equality, not substring:
    /// "remaining" must not read as campus "main".
    pub fn match_value(&self, slot: &str, text: &str) -> Option<&'static str> {
        let words: Vec<String> = text
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .collect();
        self.domain(slot)
            .iter()
            .find(|value| {
                let wanted = value.to_lowercase();
                words.iter().any(|w| *w == wanted)
            })
            .copied()
    }
}

impl Default for SlotRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
