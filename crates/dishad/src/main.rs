//! Disha Daemon - campus policy answer service.
//!
//! Wires the built-in classifier, the rules engine, the optional RAG
//! collaborator, and the ticket spool into the pipeline, then serves
//! the HTTP API.

use anyhow::Result;
use clap::Parser;
use dishad::classifier::PatternClassifier;
use dishad::collaborators::{RagPipeline, RulesEngine};
use dishad::config::{DishaConfig, CONFIG_PATH};
use dishad::pipeline::Pipeline;
use dishad::rag::RemoteRag;
use dishad::rules::StaticRulesEngine;
use dishad::server::{self, AppState};
use dishad::session::SessionStore;
use dishad::ticket::{FileTicketStore, TicketAdapter};
use disha_shared::slots::SlotRegistry;
use disha_shared::stats::StatsEngine;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "dishad")]
#[command(about = "Disha - campus policy answer daemon", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the config file
    #[arg(long, default_value = CONFIG_PATH)]
    config: String,

    /// Override the bind address from the config
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    info!("Disha Daemon v{} starting", env!("CARGO_PKG_VERSION"));

    let config = DishaConfig::load(&cli.config)?;
    let bind = cli.bind.unwrap_or_else(|| config.server.bind.clone());

    let rules: Arc<dyn RulesEngine> = match &config.rules.records_path {
        Some(path) => {
            let engine = StaticRulesEngine::from_path(path)?;
            info!("Loaded rules records from {}", path);
            Arc::new(engine)
        }
        None => {
            warn!("No rules records configured, using built-in samples");
            Arc::new(StaticRulesEngine::sample())
        }
    };

    let rag: Option<Arc<dyn RagPipeline>> = match &config.rag.endpoint {
        Some(endpoint) => {
            let remote = RemoteRag::new(
                endpoint.clone(),
                Duration::from_secs(config.rag.timeout_secs),
            )?;
            info!("RAG collaborator at {}", endpoint);
            Some(Arc::new(remote))
        }
        None => {
            info!("No RAG endpoint configured, rules path only");
            None
        }
    };

    let tickets = TicketAdapter::new(
        Arc::new(FileTicketStore::new(&config.ticket.spool_path)),
        Duration::from_millis(config.ticket.deadline_ms),
    );

    let stats = Arc::new(StatsEngine::new());
    let pipeline = Pipeline::new(
        Arc::new(PatternClassifier::new(SlotRegistry::builtin())),
        rules,
        rag,
        tickets,
        SessionStore::new(Duration::from_secs(config.pipeline.session_ttl_secs)),
        Arc::clone(&stats),
        config.guard_config(),
        config.pipeline.classification_threshold,
    );

    let state = AppState::new(pipeline, stats, &config);
    server::run(state, &bind).await
}
