//! Guard chain: independent validators over a candidate answer.
//!
//! Order and semantics:
//! 1. Language guard - unsupported language short-circuits the chain;
//!    the other guards have no evidence worth checking, so the verdict
//!    carries `lang_mismatch` alone.
//! 2. Citation guard - at least one source with URL and positive page.
//! 3. Temporal guard - rejects sources older than the staleness window
//!    when a newer policy version exists; otherwise selects the most
//!    recent citable source as `preferred_source`.
//! 4. Numeric consistency guard - every numeric token in the answer
//!    must be supported by some evidence text.
//! 5. Confidence gate - weighted sum of quality signals against a
//!    fixed threshold. Its score is reported as `confidence` whether
//!    or not the gate passes.
//!
//! Guards 2-5 accumulate reasons; `passed` is true iff none fired.
//! The whole chain is a pure computation, no I/O.

use crate::contract::{CandidateAnswer, ReasonCode, Source};
use crate::lang::LanguageTag;
use crate::numeric::{self, NumericToken};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Tunables for the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// A cited source older than this is stale when a newer policy
    /// version exists for the same procedure.
    pub stale_after_days: i64,
    /// Minimum confidence-gate score.
    pub confidence_threshold: f64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            stale_after_days: 180,
            confidence_threshold: 0.7,
        }
    }
}

/// Outcome of running the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardVerdict {
    pub passed: bool,
    pub reasons: Vec<ReasonCode>,
    /// Confidence-gate score, reported pass or fail.
    pub confidence: f64,
    /// Most recent citable source; absent when the temporal guard
    /// flagged it stale.
    pub preferred_source: Option<Source>,
    /// Numeric tokens in the answer with no evidence support.
    pub missing_numerics: Vec<NumericToken>,
}

impl GuardVerdict {
    fn lang_mismatch() -> Self {
        Self {
            passed: false,
            reasons: vec![ReasonCode::LangMismatch],
            // No gate runs on the language short-circuit.
            confidence: 0.0,
            preferred_source: None,
            missing_numerics: Vec::new(),
        }
    }
}

/// Run the chain against a candidate, using today's date for staleness.
pub fn evaluate(candidate: &CandidateAnswer, lang: LanguageTag, cfg: &GuardConfig) -> GuardVerdict {
    evaluate_at(candidate, lang, cfg, Utc::now().date_naive())
}

/// Run the chain with an explicit "today", so staleness is testable.
pub fn evaluate_at(
    candidate: &CandidateAnswer,
    lang: LanguageTag,
    cfg: &GuardConfig,
    today: NaiveDate,
) -> GuardVerdict {
    if !lang.is_supported() {
        return GuardVerdict::lang_mismatch();
    }

    let mut reasons = Vec::new();

    // Citation guard.
    let citable: Vec<&Source> = candidate.sources.iter().filter(|s| s.is_citable()).collect();
    if citable.is_empty() {
        reasons.push(ReasonCode::NoCitation);
    }

    // Temporal guard. A source flagged stale does not qualify as the
    // preferred source.
    let mut preferred_source = citable
        .iter()
        .max_by_key(|s| s.updated_at)
        .map(|s| (*s).clone());
    if let Some(preferred) = &preferred_source {
        let cutoff = today - Duration::days(cfg.stale_after_days);
        let newer_exists = candidate
            .newest_policy_date
            .is_some_and(|newest| newest > preferred.updated_at);
        if preferred.updated_at < cutoff && newer_exists {
            reasons.push(ReasonCode::StaleSource);
            preferred_source = None;
        }
    }

    // Numeric consistency guard.
    let missing_numerics =
        numeric::unsupported_tokens(&candidate.answer, &candidate.evidence_texts);
    if !missing_numerics.is_empty() {
        reasons.push(ReasonCode::NumericMismatch);
    }

    // Confidence gate.
    let confidence = confidence_score(
        candidate.margin,
        candidate.coverage,
        true,
        candidate.factual_score,
        candidate.source_quality,
    );
    if confidence < cfg.confidence_threshold {
        reasons.push(ReasonCode::LowConfidence);
    }

    GuardVerdict {
        passed: reasons.is_empty(),
        reasons,
        confidence,
        preferred_source,
        missing_numerics,
    }
}

/// Weighted confidence score. Base weights: margin 0.3, coverage 0.3,
/// language 0.1, factual 0.2, source quality 0.1. When an optional
/// signal is absent its weight is split evenly onto margin and
/// coverage, so the score stays on a 0-1 scale.
pub fn confidence_score(
    margin: f64,
    coverage: f64,
    lang_ok: bool,
    factual_score: Option<f64>,
    source_quality: Option<f64>,
) -> f64 {
    let mut w_margin = 0.3;
    let mut w_coverage = 0.3;
    let w_lang = 0.1;
    let w_factual = 0.2;
    let w_source = 0.1;

    let mut score = 0.0;
    match factual_score {
        Some(f) => score += w_factual * f.clamp(0.0, 1.0),
        None => {
            w_margin += w_factual / 2.0;
            w_coverage += w_factual / 2.0;
        }
    }
    match source_quality {
        Some(q) => score += w_source * q.clamp(0.0, 1.0),
        None => {
            w_margin += w_source / 2.0;
            w_coverage += w_source / 2.0;
        }
    }

    score += w_margin * margin.clamp(0.0, 1.0);
    score += w_coverage * coverage.clamp(0.0, 1.0);
    score += w_lang * if lang_ok { 1.0 } else { 0.0 };
    score
}
