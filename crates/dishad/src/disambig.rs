//! Disambiguation resolver.
//!
//! Decides, after merging this turn's slots into the session, whether
//! the intent can proceed to answer generation or the user must be
//! asked again. A clarification turn re-asks for *all* still-missing
//! required slots, with chips drawn from the static domains. No guard
//! runs and no ticket is created on this path.

use crate::session::SessionStore;
use disha_shared::contract::AnswerContract;
use disha_shared::slots::SlotRegistry;
use std::collections::BTreeMap;

/// Outcome of slot resolution for one turn.
pub enum Resolution {
    /// All required slots present; proceed to answer generation with
    /// the merged slot map. The session entry has been cleared.
    Complete(BTreeMap<String, String>),
    /// Input underspecified; reply with this disambiguation contract.
    Clarify(Box<AnswerContract>),
}

/// Resolve slots for a known intent. Stateless when the client sent
/// no session id: only this turn's slots count.
pub fn resolve(
    registry: &SlotRegistry,
    sessions: &SessionStore,
    session_id: Option<&str>,
    intent: &str,
    new_slots: &BTreeMap<String, String>,
) -> Resolution {
    let collected = match session_id {
        Some(id) => sessions.merge(id, intent, new_slots),
        None => new_slots.clone(),
    };

    let missing = registry.missing(intent, &collected);
    if missing.is_empty() {
        if let Some(id) = session_id {
            sessions.clear(id);
        }
        return Resolution::Complete(collected);
    }

    let required = registry.required(intent);
    let filled = required.len() - missing.len();
    // Confidence grows with each satisfied required slot, capped at 0.9.
    let confidence = (0.75 + 0.07 * filled as f64).min(0.9);
    let chips = registry.chips_for(&missing);

    Resolution::Clarify(Box::new(AnswerContract::disambiguation(
        intent, collected, chips, confidence,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::time::Duration;

    fn store() -> SessionStore {
        SessionStore::new(Duration::from_secs(600))
    }

    fn slots(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_slots_ask_for_all_required() {
        let registry = SlotRegistry::builtin();
        let sessions = store();
        let outcome = resolve(&registry, &sessions, Some("s1"), "fee_deadline", &slots(&[]));
        let Resolution::Clarify(contract) = outcome else {
            panic!("expected clarification");
        };
        let chips = contract.chips.as_ref().unwrap();
        let keys: Vec<&str> = chips.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["campus", "program", "semester"]);
        assert_relative_eq!(contract.confidence, 0.75);
        assert!(contract.invariants_hold());
    }

    #[test]
    fn confidence_grows_per_filled_slot_capped() {
        let registry = SlotRegistry::builtin();
        let sessions = store();
        let outcome = resolve(
            &registry,
            &sessions,
            Some("s1"),
            "fee_deadline",
            &slots(&[("program", "BTech"), ("semester", "3")]),
        );
        let Resolution::Clarify(contract) = outcome else {
            panic!("expected clarification");
        };
        assert_relative_eq!(contract.confidence, 0.75 + 0.07 * 2.0);
        assert!(contract.confidence <= 0.9);
    }

    #[test]
    fn chips_cover_only_missing_slots() {
        let registry = SlotRegistry::builtin();
        let sessions = store();
        let outcome = resolve(
            &registry,
            &sessions,
            Some("s1"),
            "fee_deadline",
            &slots(&[("program", "BTech")]),
        );
        let Resolution::Clarify(contract) = outcome else {
            panic!("expected clarification");
        };
        let chips = contract.chips.as_ref().unwrap();
        assert!(!chips.contains_key("program"));
        assert!(chips.contains_key("semester"));
        assert!(chips.contains_key("campus"));
    }

    #[test]
    fn multi_turn_fill_completes_and_clears_session() {
        let registry = SlotRegistry::builtin();
        let sessions = store();
        let first = resolve(
            &registry,
            &sessions,
            Some("s1"),
            "fee_deadline",
            &slots(&[("program", "BTech")]),
        );
        assert!(matches!(first, Resolution::Clarify(_)));

        let second = resolve(
            &registry,
            &sessions,
            Some("s1"),
            "fee_deadline",
            &slots(&[("semester", "3"), ("campus", "main")]),
        );
        let Resolution::Complete(collected) = second else {
            panic!("expected completion");
        };
        assert_eq!(collected["program"], "BTech");
        assert_eq!(collected["campus"], "main");

        // Session was cleared: a new underspecified turn starts over.
        let third = resolve(&registry, &sessions, Some("s1"), "fee_deadline", &slots(&[]));
        let Resolution::Clarify(contract) = third else {
            panic!("expected clarification");
        };
        assert_eq!(contract.chips.as_ref().unwrap().len(), 3);
    }

    #[test]
    fn stateless_turn_uses_only_current_slots() {
        let registry = SlotRegistry::builtin();
        let sessions = store();
        let outcome = resolve(
            &registry,
            &sessions,
            None,
            "fee_deadline",
            &slots(&[("program", "BTech"), ("semester", "3"), ("campus", "main")]),
        );
        assert!(matches!(outcome, Resolution::Complete(_)));
    }
}
