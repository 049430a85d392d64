//! Per-session slot-filling state.
//!
//! A session entry exists only while a clarification is pending. It is
//! created on the first turn that needs more slots, merged on every
//! following turn (newest turn wins on key collision), and discarded
//! once the required slots are complete or the TTL elapses. One mutex
//! over the map serializes racing requests for the same session id;
//! the later write wins.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct SessionState {
    pending_intent: String,
    collected_slots: BTreeMap<String, String>,
    created_at: Instant,
}

pub struct SessionStore {
    ttl: Duration,
    entries: Mutex<HashMap<String, SessionState>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Merge this turn's slots into the session and return the full
    /// collected map. An expired entry, or one pending a different
    /// intent, is treated as a fresh start.
    pub fn merge(
        &self,
        session_id: &str,
        intent: &str,
        new_slots: &BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|_, state| state.created_at.elapsed() < self.ttl);

        let state = entries
            .entry(session_id.to_string())
            .and_modify(|state| {
                if state.pending_intent != intent {
                    state.pending_intent = intent.to_string();
                    state.collected_slots.clear();
                    state.created_at = Instant::now();
                }
            })
            .or_insert_with(|| SessionState {
                pending_intent: intent.to_string(),
                collected_slots: BTreeMap::new(),
                created_at: Instant::now(),
            });

        for (key, value) in new_slots {
            state.collected_slots.insert(key.clone(), value.clone());
        }
        state.collected_slots.clone()
    }

    /// Drop the session entry (required slots satisfied).
    pub fn clear(&self, session_id: &str) {
        self.entries.lock().unwrap().remove(session_id);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn merges_across_turns_with_new_value_winning() {
        let store = SessionStore::new(Duration::from_secs(600));
        store.merge("s1", "fee_deadline", &slots(&[("program", "BTech")]));
        let merged = store.merge(
            "s1",
            "fee_deadline",
            &slots(&[("program", "MBA"), ("semester", "3")]),
        );
        assert_eq!(merged["program"], "MBA");
        assert_eq!(merged["semester"], "3");
    }

    #[test]
    fn expired_session_starts_fresh() {
        let store = SessionStore::new(Duration::from_millis(10));
        store.merge("s1", "fee_deadline", &slots(&[("program", "BTech")]));
        std::thread::sleep(Duration::from_millis(25));
        let merged = store.merge("s1", "fee_deadline", &slots(&[("semester", "3")]));
        assert!(!merged.contains_key("program"));
        assert_eq!(merged["semester"], "3");
    }

    #[test]
    fn intent_change_discards_collected_slots() {
        let store = SessionStore::new(Duration::from_secs(600));
        store.merge("s1", "fee_deadline", &slots(&[("program", "BTech")]));
        let merged = store.merge("s1", "hostel_fee_due", &slots(&[("campus", "main")]));
        assert!(!merged.contains_key("program"));
        assert_eq!(merged["campus"], "main");
    }

    #[test]
    fn clear_removes_entry() {
        let store = SessionStore::new(Duration::from_secs(600));
        store.merge("s1", "fee_deadline", &slots(&[("program", "BTech")]));
        store.clear("s1");
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn sessions_are_isolated_by_id() {
        let store = SessionStore::new(Duration::from_secs(600));
        store.merge("s1", "fee_deadline", &slots(&[("program", "BTech")]));
        let merged = store.merge("s2", "fee_deadline", &slots(&[("semester", "5")]));
        assert!(!merged.contains_key("program"));
    }
}
