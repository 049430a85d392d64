//! Configuration management for dishad.
//!
//! Loads settings from a TOML file or uses defaults. Every field has
//! a serde default so a partial config file is fine; a missing file
//! logs a warning and runs on defaults.

use anyhow::{Context, Result};
use disha_shared::guards::GuardConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Default config file path.
pub const CONFIG_PATH: &str = "/etc/disha/config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DishaConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub guard: GuardSettings,
    #[serde(default)]
    pub ticket: TicketConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub rag: RagConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address. Localhost only by default.
    #[serde(default = "default_bind")]
    pub bind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Below this classifier confidence the intent is treated as unknown.
    #[serde(default = "default_classification_threshold")]
    pub classification_threshold: f64,

    /// Slot-filling session lifetime.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardSettings {
    #[serde(default = "default_stale_after_days")]
    pub stale_after_days: i64,

    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketConfig {
    /// Hard wall-clock deadline for ticket creation.
    #[serde(default = "default_ticket_deadline")]
    pub deadline_ms: u64,

    /// Where the file ticket store appends its JSON lines.
    #[serde(default = "default_ticket_spool")]
    pub spool_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_rate_window")]
    pub window_secs: u64,

    /// Requests allowed per client key per window.
    #[serde(default = "default_rate_max")]
    pub max_requests: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Optional path to the deterministic rules record file.
    #[serde(default)]
    pub records_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    /// Optional URL of the external RAG composer.
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_rag_timeout")]
    pub timeout_secs: u64,
}

fn default_bind() -> String {
    "127.0.0.1:7870".to_string()
}

fn default_classification_threshold() -> f64 {
    0.6
}

fn default_session_ttl() -> u64 {
    600
}

fn default_stale_after_days() -> i64 {
    180
}

fn default_confidence_threshold() -> f64 {
    0.7
}

fn default_ticket_deadline() -> u64 {
    2000
}

fn default_ticket_spool() -> String {
    "/var/lib/disha/tickets.jsonl".to_string()
}

fn default_rate_window() -> u64 {
    60
}

fn default_rate_max() -> u32 {
    30
}

fn default_rag_timeout() -> u64 {
    8
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            classification_threshold: default_classification_threshold(),
            session_ttl_secs: default_session_ttl(),
        }
    }
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            stale_after_days: default_stale_after_days(),
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            deadline_ms: default_ticket_deadline(),
            spool_path: default_ticket_spool(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: default_rate_window(),
            max_requests: default_rate_max(),
        }
    }
}

impl DishaConfig {
    /// Load config from `path`, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            warn!("Config file {} not found, using defaults", path);
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path))?;
        let config: Self =
            toml::from_str(&raw).with_context(|| format!("parsing config file {}", path))?;
        info!("Loaded config from {}", path);
        Ok(config)
    }

    pub fn guard_config(&self) -> GuardConfig {
        GuardConfig {
            stale_after_days: self.guard.stale_after_days,
            confidence_threshold: self.guard.confidence_threshold,
        }
    }
}
