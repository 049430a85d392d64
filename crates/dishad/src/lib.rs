//! Disha daemon: the answer-contract pipeline behind `/ask`.
//!
//! The pipeline sits between candidate-answer generation and the
//! client. It decides whether a candidate is safe to return, asks for
//! clarification when input is underspecified, and degrades to an
//! apology plus support ticket when trust checks fail - all under a
//! hard latency budget for the ticket side effect.

pub mod classifier;
pub mod collaborators;
pub mod config;
pub mod disambig;
pub mod pipeline;
pub mod rag;
pub mod rate_limit;
pub mod redact;
pub mod routes;
pub mod rules;
pub mod server;
pub mod session;
pub mod ticket;
