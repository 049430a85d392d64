//! Shared types and pure logic for Disha components.
//!
//! Everything in this crate is I/O free: the answer contract, the
//! guard chain, the slot registry, the numeric tokenizer, and the
//! stats engine. The daemon crate (`dishad`) owns all network and
//! filesystem concerns.

pub mod contract;
pub mod error;
pub mod guards;
pub mod lang;
pub mod numeric;
pub mod slots;
pub mod stats;

/// Single source of truth for the Disha version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
