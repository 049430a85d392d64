//! HTTP client for the external RAG composer.
//!
//! The retrieve-rerank-compose pipeline is a separate service. This
//! client posts the query and deserializes the composed candidate;
//! every transport or decode problem surfaces as `DishaError::Rag`
//! and the pipeline degrades from there.

use crate::collaborators::RagPipeline;
use async_trait::async_trait;
use chrono::NaiveDate;
use disha_shared::contract::{AnswerPath, CandidateAnswer, Source};
use disha_shared::error::DishaError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ComposeRequest<'a> {
    text: &'a str,
    intent: Option<&'a str>,
    slots: &'a BTreeMap<String, String>,
}

/// Wire shape of the composer's reply.
#[derive(Debug, Deserialize)]
struct ComposeResponse {
    answer: String,
    #[serde(default)]
    sources: Vec<Source>,
    #[serde(default)]
    evidence_texts: Vec<String>,
    #[serde(default)]
    margin: f64,
    #[serde(default)]
    coverage: f64,
    #[serde(default)]
    factual_score: Option<f64>,
    #[serde(default)]
    source_quality: Option<f64>,
    #[serde(default)]
    newest_policy_date: Option<NaiveDate>,
}

pub struct RemoteRag {
    endpoint: String,
    client: reqwest::Client,
}

impl RemoteRag {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self, DishaError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DishaError::Rag(format!("building client: {}", e)))?;
        Ok(Self { endpoint, client })
    }
}

#[async_trait]
impl RagPipeline for RemoteRag {
    async fn answer(
        &self,
        text: &str,
        intent: Option<&str>,
        slots: &BTreeMap<String, String>,
    ) -> Result<CandidateAnswer, DishaError> {
        let request = ComposeRequest { text, intent, slots };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| DishaError::Rag(format!("composer unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(DishaError::Rag(format!(
                "composer returned {}",
                response.status()
            )));
        }

        let composed: ComposeResponse = response
            .json()
            .await
            .map_err(|e| DishaError::Rag(format!("decoding composer reply: {}", e)))?;

        Ok(CandidateAnswer {
            path: AnswerPath::Rag,
            answer: composed.answer,
            sources: composed.sources,
            evidence_texts: composed.evidence_texts,
            margin: composed.margin,
            coverage: composed.coverage,
            factual_score: composed.factual_score,
            source_quality: composed.source_quality,
            newest_policy_date: composed.newest_policy_date,
        })
    }
}
