//! Static rules engine: deterministic answers from a record table.
//!
//! Each record pins one intent plus a slot combination to a
//! fully-written answer, its citation, and the evidence behind it.
//! Records load from a TOML file; a small built-in table backs the
//! daemon when none is configured. The persistent policy database and
//! its schema live outside this core - this engine is the seam where
//! it plugs in.

use crate::collaborators::RulesEngine;
use async_trait::async_trait;
use chrono::NaiveDate;
use disha_shared::contract::{AnswerPath, CandidateAnswer, Source};
use disha_shared::error::DishaError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;

/// One deterministic answer record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleRecord {
    pub intent: String,
    /// Slot values this record answers for. A record applies when
    /// every entry here matches the collected slots.
    #[serde(rename = "match")]
    pub slot_match: BTreeMap<String, String>,
    pub answer: String,
    pub source: Source,
    pub evidence: Vec<String>,
    /// Most recent effective version known for the same procedure.
    #[serde(default)]
    pub newest_policy_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RuleFile {
    #[serde(default)]
    records: Vec<RuleRecord>,
}

pub struct StaticRulesEngine {
    records: Vec<RuleRecord>,
}

impl StaticRulesEngine {
    pub fn from_records(records: Vec<RuleRecord>) -> Self {
        Self { records }
    }

    pub fn from_path(path: &str) -> Result<Self, DishaError> {
        let raw = fs::read_to_string(path)?;
        let file: RuleFile = toml::from_str(&raw)
            .map_err(|e| DishaError::Config(format!("rules file {}: {}", path, e)))?;
        Ok(Self::from_records(file.records))
    }

    /// Built-in demo records for running without a record file.
    pub fn sample() -> Self {
        let records = vec![
            RuleRecord {
                intent: "fee_deadline".to_string(),
                slot_match: BTreeMap::from([
                    ("program".to_string(), "BTech".to_string()),
                    ("semester".to_string(), "3".to_string()),
                    ("campus".to_string(), "main".to_string()),
                ]),
                answer: "The fee deadline for BTech semester 3 at the main campus is August 15, 2026."
                    .to_string(),
                source: Source {
                    url: "https://campus.example.edu/policies/fee-schedule-2026.pdf".to_string(),
                    page: 4,
                    title: "Fee Schedule 2026-27".to_string(),
                    updated_at: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
                },
                evidence: vec![
                    "Semester 3 fees for BTech (main campus) must be paid by 2026-08-15."
                        .to_string(),
                ],
                newest_policy_date: None,
            },
            RuleRecord {
                intent: "hostel_fee_due".to_string(),
                slot_match: BTreeMap::from([
                    ("campus".to_string(), "main".to_string()),
                    ("semester".to_string(), "1".to_string()),
                ]),
                answer: "The hostel fee of ₹45,500 for semester 1 at the main campus is due by 2026-07-20."
                    .to_string(),
                source: Source {
                    url: "https://campus.example.edu/policies/hostel-fees-2026.pdf".to_string(),
                    page: 2,
                    title: "Hostel Fee Circular 2026".to_string(),
                    updated_at: NaiveDate::from_ymd_opt(2026, 5, 10).unwrap(),
                },
                evidence: vec![
                    "Hostel fee for semester 1, main campus: ₹45,500, payable by 2026-07-20."
                        .to_string(),
                ],
                newest_policy_date: None,
            },
        ];
        Self::from_records(records)
    }

    fn record_for(&self, intent: &str, slots: &BTreeMap<String, String>) -> Option<&RuleRecord> {
        self.records.iter().find(|record| {
            record.intent == intent
                && record.slot_match.iter().all(|(key, want)| {
                    slots
                        .get(key)
                        .is_some_and(|have| have.eq_ignore_ascii_case(want))
                })
        })
    }
}

#[async_trait]
impl RulesEngine for StaticRulesEngine {
    async fn fetch(
        &self,
        intent: &str,
        slots: &BTreeMap<String, String>,
    ) -> Result<Option<CandidateAnswer>, DishaError> {
        let Some(record) = self.record_for(intent, slots) else {
            return Ok(None);
        };
        Ok(Some(CandidateAnswer {
            path: AnswerPath::Rules,
            answer: record.answer.clone(),
            sources: vec![record.source.clone()],
            evidence_texts: record.evidence.clone(),
            // Deterministic lookup: full retrieval margin, full coverage.
            margin: 1.0,
            coverage: 1.0,
            factual_score: None,
            source_quality: Some(1.0),
            newest_policy_date: record.newest_policy_date,
        }))
    }
}
