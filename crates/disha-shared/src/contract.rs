//! Answer contract - the canonical response envelope for every `/ask` request.
//!
//! The contract is the system's only output shape. Its per-mode
//! constructors are the sole way to build one, which is how the
//! non-negotiable invariant (no uncited `rules`/`rag` answer) is kept
//! out of reach of the rest of the pipeline:
//! - `rules`/`rag`: sources non-empty, reasons empty
//! - `disambiguation`: no sources, no ticket, chips non-empty
//! - `fallback`: fixed apology text, reasons non-empty, nothing leaked

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fixed apology text for fallback contracts.
pub const APOLOGY_TEXT: &str =
    "I'm sorry, I couldn't find a reliable answer to your question.";

/// Sentinel ticket id returned when ticket creation exceeds its deadline.
pub const TIMEOUT_TICKET_ID: &str = "TIMEOUT-TICKET";

/// Which strategy produced (or failed to produce) the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMode {
    Rules,
    Rag,
    Disambiguation,
    Fallback,
}

impl std::fmt::Display for AnswerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Rules => "rules",
            Self::Rag => "rag",
            Self::Disambiguation => "disambiguation",
            Self::Fallback => "fallback",
        };
        write!(f, "{}", s)
    }
}

/// Candidate-answer generation path. Maps onto `AnswerMode` on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerPath {
    Rules,
    Rag,
}

impl From<AnswerPath> for AnswerMode {
    fn from(path: AnswerPath) -> Self {
        match path {
            AnswerPath::Rules => AnswerMode::Rules,
            AnswerPath::Rag => AnswerMode::Rag,
        }
    }
}

/// Named failure reason. Surfaced verbatim in fallback contracts,
/// never swallowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    IntentUnknown,
    NoCitation,
    StaleSource,
    NumericMismatch,
    LangMismatch,
    LowConfidence,
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::IntentUnknown => "intent_unknown",
            Self::NoCitation => "no_citation",
            Self::StaleSource => "stale_source",
            Self::NumericMismatch => "numeric_mismatch",
            Self::LangMismatch => "lang_mismatch",
            Self::LowConfidence => "low_confidence",
        };
        write!(f, "{}", s)
    }
}

/// A citation attached to an answer. Immutable once attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    /// 1-based page number in the cited document.
    pub page: u32,
    pub title: String,
    /// Effective date of the cited policy version.
    pub updated_at: NaiveDate,
}

impl Source {
    /// A source counts as a citation only with a URL and a positive page.
    pub fn is_citable(&self) -> bool {
        !self.url.trim().is_empty() && self.page >= 1
    }
}

/// Candidate answer as supplied by the Rules or RAG collaborator,
/// before any guard has seen it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateAnswer {
    pub path: AnswerPath,
    pub answer: String,
    pub sources: Vec<Source>,
    pub evidence_texts: Vec<String>,
    /// Retrieval margin between the top candidate and the runner-up.
    pub margin: f64,
    /// Fraction of the answer covered by evidence (0.0-1.0).
    pub coverage: f64,
    pub factual_score: Option<f64>,
    pub source_quality: Option<f64>,
    /// Most recent effective policy version known for the same
    /// procedure, used by the temporal guard.
    pub newest_policy_date: Option<NaiveDate>,
}

impl CandidateAnswer {
    /// Degraded candidate for a generation path that produced nothing.
    /// Guaranteed to fail the citation guard and the confidence gate.
    pub fn empty(path: AnswerPath) -> Self {
        Self {
            path,
            answer: String::new(),
            sources: Vec::new(),
            evidence_texts: Vec::new(),
            margin: 0.0,
            coverage: 0.0,
            factual_score: None,
            source_quality: None,
            newest_policy_date: None,
        }
    }
}

/// The response envelope. Field names are stable across all modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerContract {
    pub mode: AnswerMode,
    pub intent: Option<String>,
    pub answer: Option<String>,
    pub slots: BTreeMap<String, String>,
    pub sources: Vec<Source>,
    pub evidence_texts: Vec<String>,
    pub chips: Option<BTreeMap<String, Vec<String>>>,
    pub reasons: Vec<ReasonCode>,
    pub ticket_id: Option<String>,
    pub confidence: f64,
    pub processing_time_ms: f64,
}

impl AnswerContract {
    /// Guard-approved answer on the rules or RAG path. The preferred
    /// source chosen by the temporal guard is moved to the front.
    pub fn answered(
        intent: &str,
        candidate: CandidateAnswer,
        slots: BTreeMap<String, String>,
        preferred_source: Option<Source>,
        confidence: f64,
    ) -> Self {
        let mut sources = candidate.sources;
        if let Some(preferred) = preferred_source {
            if let Some(pos) = sources.iter().position(|s| *s == preferred) {
                sources.remove(pos);
            }
            sources.insert(0, preferred);
        }
        Self {
            mode: candidate.path.into(),
            intent: Some(intent.to_string()),
            answer: Some(candidate.answer),
            slots,
            sources,
            evidence_texts: candidate.evidence_texts,
            chips: None,
            reasons: Vec::new(),
            ticket_id: None,
            confidence,
            processing_time_ms: 0.0,
        }
    }

    /// Clarification turn: chips for the missing slots, no guards,
    /// no ticket, no sources.
    pub fn disambiguation(
        intent: &str,
        slots: BTreeMap<String, String>,
        chips: BTreeMap<String, Vec<String>>,
        confidence: f64,
    ) -> Self {
        Self {
            mode: AnswerMode::Disambiguation,
            intent: Some(intent.to_string()),
            answer: Some("Could you please provide more details?".to_string()),
            slots,
            sources: Vec::new(),
            evidence_texts: Vec::new(),
            chips: Some(chips),
            reasons: Vec::new(),
            ticket_id: None,
            confidence,
            processing_time_ms: 0.0,
        }
    }

    /// Safe degradation: the fixed apology, the accumulated reasons,
    /// and (possibly) a ticket id. Candidate text, sources, and
    /// evidence are deliberately not carried over.
    pub fn fallback(
        intent: Option<&str>,
        reasons: Vec<ReasonCode>,
        ticket_id: Option<String>,
        confidence: f64,
    ) -> Self {
        debug_assert!(!reasons.is_empty(), "fallback requires at least one reason");
        Self {
            mode: AnswerMode::Fallback,
            intent: intent.map(str::to_string),
            answer: Some(APOLOGY_TEXT.to_string()),
            slots: BTreeMap::new(),
            sources: Vec::new(),
            evidence_texts: Vec::new(),
            chips: None,
            reasons,
            ticket_id,
            confidence,
            processing_time_ms: 0.0,
        }
    }

    /// Record the end-to-end latency. Set on every path.
    pub fn with_timing(mut self, elapsed_ms: f64) -> Self {
        self.processing_time_ms = elapsed_ms;
        self
    }

    /// Check the per-mode invariants. Used in tests and debug assertions.
    pub fn invariants_hold(&self) -> bool {
        match self.mode {
            AnswerMode::Rules | AnswerMode::Rag => {
                !self.sources.is_empty()
                    && self.sources.iter().all(Source::is_citable)
                    && self.reasons.is_empty()
            }
            AnswerMode::Disambiguation => {
                self.sources.is_empty()
                    && self.ticket_id.is_none()
                    && self.reasons.is_empty()
                    && self.chips.as_ref().is_some_and(|c| !c.is_empty())
            }
            AnswerMode::Fallback => {
                self.answer.as_deref() == Some(APOLOGY_TEXT)
                    && self.sources.is_empty()
                    && self.evidence_texts.is_empty()
                    && !self.reasons.is_empty()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> Source {
        Source {
            url: "https://campus.example.edu/policies/fees.pdf".to_string(),
            page: 3,
            title: "Fee Payment Policy".to_string(),
            updated_at: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
        }
    }

    fn candidate() -> CandidateAnswer {
        CandidateAnswer {
            path: AnswerPath::Rules,
            answer: "The fee deadline is 2026-08-15.".to_string(),
            sources: vec![source()],
            evidence_texts: vec!["Fees are due by 2026-08-15.".to_string()],
            margin: 0.9,
            coverage: 1.0,
            factual_score: None,
            source_quality: None,
            newest_policy_date: None,
        }
    }

    #[test]
    fn answered_contract_holds_invariants() {
        let contract = AnswerContract::answered(
            "fee_deadline",
            candidate(),
            BTreeMap::new(),
            None,
            0.92,
        );
        assert_eq!(contract.mode, AnswerMode::Rules);
        assert!(contract.invariants_hold());
    }

    #[test]
    fn preferred_source_moves_to_front() {
        let mut cand = candidate();
        let newer = Source {
            updated_at: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
            ..source()
        };
        cand.sources.push(newer.clone());
        let contract = AnswerContract::answered(
            "fee_deadline",
            cand,
            BTreeMap::new(),
            Some(newer.clone()),
            0.9,
        );
        assert_eq!(contract.sources[0], newer);
        assert_eq!(contract.sources.len(), 2);
    }

    #[test]
    fn fallback_never_leaks_answer_or_sources() {
        let contract = AnswerContract::fallback(
            Some("fee_deadline"),
            vec![ReasonCode::NoCitation],
            None,
            0.2,
        );
        assert!(contract.invariants_hold());
        assert_eq!(contract.answer.as_deref(), Some(APOLOGY_TEXT));
        assert!(contract.sources.is_empty());
    }

    #[test]
    fn disambiguation_contract_holds_invariants() {
        let mut chips = BTreeMap::new();
        chips.insert("program".to_string(), vec!["BTech".to_string()]);
        let contract =
            AnswerContract::disambiguation("fee_deadline", BTreeMap::new(), chips, 0.75);
        assert!(contract.invariants_hold());
        assert!(contract.ticket_id.is_none());
    }

    #[test]
    fn reason_codes_serialize_snake_case() {
        let json = serde_json::to_string(&ReasonCode::LangMismatch).unwrap();
        assert_eq!(json, "\"lang_mismatch\"");
        let json = serde_json::to_string(&ReasonCode::IntentUnknown).unwrap();
        assert_eq!(json, "\"intent_unknown\"");
    }

    #[test]
    fn contract_serializes_stable_field_names() {
        let contract = AnswerContract::fallback(None, vec![ReasonCode::IntentUnknown], None, 0.0);
        let value = serde_json::to_value(&contract).unwrap();
        for field in [
            "mode",
            "intent",
            "answer",
            "slots",
            "sources",
            "chips",
            "reasons",
            "ticket_id",
            "confidence",
            "processing_time_ms",
        ] {
            assert!(value.get(field).is_some(), "missing field {}", field);
        }
        assert_eq!(value["mode"], "fallback");
    }

    #[test]
    fn source_without_url_is_not_citable() {
        let mut s = source();
        s.url = "  ".to_string();
        assert!(!s.is_citable());
    }
}
