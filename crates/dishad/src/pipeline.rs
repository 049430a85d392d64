//! Request pipeline: classify, disambiguate, generate, guard, respond.
//!
//! One `handle` call per request. Every terminal state yields a
//! well-formed contract with end-to-end timing; collaborator failures
//! degrade the request instead of erroring it. Tickets are a side
//! effect of the fallback path only.

use crate::classifier::PatternClassifier;
use crate::collaborators::{Classification, Classifier, RagPipeline, RulesEngine};
use crate::disambig::{self, Resolution};
use crate::session::SessionStore;
use crate::ticket::TicketAdapter;
use disha_shared::contract::{AnswerContract, AnswerPath, CandidateAnswer, ReasonCode};
use disha_shared::guards::{self, GuardConfig};
use disha_shared::lang::LanguageTag;
use disha_shared::slots::SlotRegistry;
use disha_shared::stats::StatsEngine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Shortest query the pipeline accepts, in characters.
pub const MIN_QUERY_CHARS: usize = 3;

/// Longest query the pipeline accepts, in characters.
pub const MAX_QUERY_CHARS: usize = 2000;

/// One `/ask` request after boundary validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub text: String,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub ctx: Option<AskContext>,
}

/// Client-carried conversation context: the session key plus any
/// intent and slots remembered from earlier turns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AskContext {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub slots: std::collections::BTreeMap<String, String>,
}

impl AskRequest {
    pub fn session_id(&self) -> Option<&str> {
        self.ctx.as_ref().and_then(|c| c.session_id.as_deref())
    }
}

pub struct Pipeline {
    classifier: Arc<dyn Classifier>,
    rules: Arc<dyn RulesEngine>,
    rag: Option<Arc<dyn RagPipeline>>,
    tickets: TicketAdapter,
    sessions: SessionStore,
    registry: SlotRegistry,
    stats: Arc<StatsEngine>,
    guard_config: GuardConfig,
    classification_threshold: f64,
}

impl Pipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        classifier: Arc<dyn Classifier>,
        rules: Arc<dyn RulesEngine>,
        rag: Option<Arc<dyn RagPipeline>>,
        tickets: TicketAdapter,
        sessions: SessionStore,
        stats: Arc<StatsEngine>,
        guard_config: GuardConfig,
        classification_threshold: f64,
    ) -> Self {
        Self {
            classifier,
            rules,
            rag,
            tickets,
            sessions,
            registry: SlotRegistry::builtin(),
            stats,
            guard_config,
            classification_threshold,
        }
    }

    /// Built-in classifier over the same slot registry the resolver uses.
    pub fn default_classifier() -> Arc<dyn Classifier> {
        Arc::new(PatternClassifier::new(SlotRegistry::builtin()))
    }

    /// Drive one request to a terminal contract. Never returns an
    /// error: every failure becomes a fallback contract.
    pub async fn handle(&self, request: &AskRequest) -> AnswerContract {
        let started = Instant::now();
        let lang = request
            .lang
            .as_deref()
            .map(LanguageTag::parse)
            .unwrap_or_default();
        let session_id = request.session_id();

        let contract = self.run(request, lang, session_id).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        self.stats
            .record(contract.mode, contract.intent.as_deref(), elapsed_ms);
        info!(
            mode = %contract.mode,
            intent = contract.intent.as_deref().unwrap_or("-"),
            elapsed_ms,
            "Request completed"
        );
        contract.with_timing(elapsed_ms)
    }

    async fn run(
        &self,
        request: &AskRequest,
        lang: LanguageTag,
        session_id: Option<&str>,
    ) -> AnswerContract {
        // Classify. A collaborator failure reads as "no intent".
        let classification = match self.classifier.classify(&request.text, lang).await {
            Ok(c) => c,
            Err(e) => {
                warn!("Classifier failed: {}", e);
                Classification::default()
            }
        };

        // Prior context stands in for what this turn's text does not
        // repeat: a known ctx intent when classification finds none,
        // ctx slots underneath this turn's extraction.
        let prior_intent = request
            .ctx
            .as_ref()
            .and_then(|c| c.intent.clone())
            .filter(|i| self.registry.known_intent(i));
        let intent = classification
            .intent
            .filter(|_| classification.confidence >= self.classification_threshold)
            .or(prior_intent);

        let Some(intent) = intent else {
            debug!(
                confidence = classification.confidence,
                "No intent above threshold"
            );
            return self
                .fallback(request, None, vec![ReasonCode::IntentUnknown], 0.0, session_id)
                .await;
        };

        let mut turn_slots = request
            .ctx
            .as_ref()
            .map(|c| c.slots.clone())
            .unwrap_or_default();
        turn_slots.extend(classification.slots);

        // Disambiguate before any generation work.
        match disambig::resolve(
            &self.registry,
            &self.sessions,
            session_id,
            &intent,
            &turn_slots,
        ) {
            Resolution::Clarify(contract) => *contract,
            Resolution::Complete(slots) => {
                let candidate = self.generate(&request.text, &intent, &slots).await;
                let verdict = guards::evaluate(&candidate, lang, &self.guard_config);
                if verdict.passed {
                    AnswerContract::answered(
                        &intent,
                        candidate,
                        slots,
                        verdict.preferred_source,
                        verdict.confidence,
                    )
                } else {
                    debug!(reasons = ?verdict.reasons, "Guard chain rejected candidate");
                    self.fallback(
                        request,
                        Some(&intent),
                        verdict.reasons,
                        verdict.confidence,
                        session_id,
                    )
                    .await
                }
            }
        }
    }

    /// Rules first; a miss or failure falls through to RAG. Either
    /// path failing yields an empty candidate, which the citation
    /// guard and confidence gate will reject.
    async fn generate(
        &self,
        text: &str,
        intent: &str,
        slots: &std::collections::BTreeMap<String, String>,
    ) -> CandidateAnswer {
        match self.rules.fetch(intent, slots).await {
            Ok(Some(candidate)) => return candidate,
            Ok(None) => debug!(intent, "No rules record, trying RAG"),
            Err(e) => warn!("Rules lookup failed: {}", e),
        }

        let Some(rag) = &self.rag else {
            return CandidateAnswer::empty(AnswerPath::Rag);
        };
        match rag.answer(text, Some(intent), slots).await {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!("RAG pipeline failed: {}", e);
                CandidateAnswer::empty(AnswerPath::Rag)
            }
        }
    }

    async fn fallback(
        &self,
        request: &AskRequest,
        intent: Option<&str>,
        reasons: Vec<ReasonCode>,
        confidence: f64,
        session_id: Option<&str>,
    ) -> AnswerContract {
        let ticket_id = self
            .tickets
            .create_ticket(&request.text, &reasons, session_id)
            .await;
        AnswerContract::fallback(intent, reasons, ticket_id, confidence)
    }
}
