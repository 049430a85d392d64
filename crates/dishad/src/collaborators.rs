//! Collaborator interfaces consumed by the pipeline.
//!
//! The classifier, the two answer-generation paths, and the ticket
//! store are external capabilities. The pipeline only sees these
//! traits; built-in implementations live in `classifier`, `rules`,
//! `rag`, and `ticket`.

use async_trait::async_trait;
use disha_shared::contract::{CandidateAnswer, ReasonCode};
use disha_shared::error::DishaError;
use disha_shared::lang::LanguageTag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Intent and slots extracted from a request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Classification {
    /// `None` when no known intent matched.
    pub intent: Option<String>,
    pub slots: BTreeMap<String, String>,
    pub confidence: f64,
}

/// Intent classifier and slot extractor.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str, lang: LanguageTag) -> Result<Classification, DishaError>;
}

/// Deterministic field lookup. `Ok(None)` means "no record", which
/// sends the request down the RAG path.
#[async_trait]
pub trait RulesEngine: Send + Sync {
    async fn fetch(
        &self,
        intent: &str,
        slots: &BTreeMap<String, String>,
    ) -> Result<Option<CandidateAnswer>, DishaError>;
}

/// Retrieve-rerank-compose collaborator. Entirely external; retries,
/// if any, are its own business.
#[async_trait]
pub trait RagPipeline: Send + Sync {
    async fn answer(
        &self,
        text: &str,
        intent: Option<&str>,
        slots: &BTreeMap<String, String>,
    ) -> Result<CandidateAnswer, DishaError>;
}

/// Persistent ticket store. Must tolerate being abandoned mid-call:
/// the adapter drops the future at its deadline.
#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn create(
        &self,
        redacted_text: &str,
        reasons: &[ReasonCode],
    ) -> Result<String, DishaError>;
}
