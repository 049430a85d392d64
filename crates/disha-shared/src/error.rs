//! Error types for Disha.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DishaError {
    #[error("Classification failed: {0}")]
    Classification(String),

    #[error("Rules lookup failed: {0}")]
    RulesLookup(String),

    #[error("RAG collaborator error: {0}")]
    Rag(String),

    #[error("Ticket store error: {0}")]
    TicketStore(String),

    #[error("Ticket creation timed out")]
    TicketTimeout,

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
