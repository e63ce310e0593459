//! Watchlist
//!
//! Session-scoped watchlist and the check cycle that walks it: fetch the latest
//! price, classify it against the entry's thresholds, dispatch any crossing.

pub mod orchestrator;
pub mod store;

pub use orchestrator::{CheckCycleOrchestrator, CheckReport, EntryOutcome, RetryPolicy};
pub use store::WatchlistStore;
