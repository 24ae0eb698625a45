//! Dripcast - drip-feed a content queue to a remote publisher
//!
//! This library provides the core selection-and-progress machinery for
//! posting one item per invocation from a fixed queue, with durable
//! progress kept in an append-only ledger file.

pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod publisher;
pub mod queue;
pub mod runner;
pub mod selector;
pub mod slot;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{DripcastError, Result};
pub use ledger::Ledger;
pub use queue::ContentQueue;
pub use runner::{RunReport, Runner};
pub use types::{ContentItem, LedgerEntry, RunOutcome};
