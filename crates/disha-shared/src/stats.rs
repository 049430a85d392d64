//! Process-wide request statistics.
//!
//! Updated once per completed request and never on the critical path:
//! mode counters are atomics, and the intent distribution and latency
//! ring sit behind short-lived mutexes. The latency ring keeps the
//! last 1000 samples.

use crate::contract::AnswerMode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Number of latency samples retained for percentile estimates.
const LATENCY_WINDOW: usize = 1000;

/// Concurrency-safe stats engine, one per process, owned by AppState.
#[derive(Debug, Default)]
pub struct StatsEngine {
    total: AtomicU64,
    rules: AtomicU64,
    rag: AtomicU64,
    disambiguation: AtomicU64,
    fallback: AtomicU64,
    rejected: AtomicU64,
    intents: Mutex<BTreeMap<String, u64>>,
    latencies: Mutex<VecDeque<f64>>,
}

/// Read-only snapshot for the `/stats` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_requests: u64,
    pub rules_responses: u64,
    pub rag_responses: u64,
    pub disambiguation_responses: u64,
    pub fallback_responses: u64,
    pub rejected_requests: u64,
    pub intent_distribution: BTreeMap<String, u64>,
    pub avg_response_time_ms: f64,
    pub p50_response_time_ms: f64,
    pub p95_response_time_ms: f64,
    pub p99_response_time_ms: f64,
}

impl StatsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed request.
    pub fn record(&self, mode: AnswerMode, intent: Option<&str>, latency_ms: f64) {
        self.total.fetch_add(1, Ordering::Relaxed);
        let counter = match mode {
            AnswerMode::Rules => &self.rules,
            AnswerMode::Rag => &self.rag,
            AnswerMode::Disambiguation => &self.disambiguation,
            AnswerMode::Fallback => &self.fallback,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if let Some(intent) = intent {
            let mut intents = self.intents.lock().unwrap();
            *intents.entry(intent.to_string()).or_insert(0) += 1;
        }

        let mut latencies = self.latencies.lock().unwrap();
        if latencies.len() == LATENCY_WINDOW {
            latencies.pop_front();
        }
        latencies.push_back(latency_ms);
    }

    /// Record a request rejected at admission (rate limit).
    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let intents = self.intents.lock().unwrap().clone();
        let mut samples: Vec<f64> = self.latencies.lock().unwrap().iter().copied().collect();
        samples.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let avg = if samples.is_empty() {
            0.0
        } else {
            samples.iter().sum::<f64>() / samples.len() as f64
        };

        StatsSnapshot {
            total_requests: self.total.load(Ordering::Relaxed),
            rules_responses: self.rules.load(Ordering::Relaxed),
            rag_responses: self.rag.load(Ordering::Relaxed),
            disambiguation_responses: self.disambiguation.load(Ordering::Relaxed),
            fallback_responses: self.fallback.load(Ordering::Relaxed),
            rejected_requests: self.rejected.load(Ordering::Relaxed),
            intent_distribution: intents,
            avg_response_time_ms: avg,
            p50_response_time_ms: percentile(&samples, 0.50),
            p95_response_time_ms: percentile(&samples, 0.95),
            p99_response_time_ms: percentile(&samples, 0.99),
        }
    }
}

/// Nearest-rank percentile over a sorted sample set.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = ((q * sorted.len() as f64).ceil() as usize).clamp(1, sorted.len());
    sorted[rank - 1]
}
