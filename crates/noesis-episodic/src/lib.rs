//! # noesis-episodic
//!
//! Episodes move through `Open` → `Closed` → `Consolidated { successor }` or
//! `Retired`. Open sessions live only in the [`SessionTracker`]; closing one
//! embeds it, scores its initial importance and indexes it for pattern search.
//! Consolidation and importance decay run one episode at a time and log and
//! skip per-item failures.

pub mod consolidation;
pub mod importance;
mod sessions;
mod store;

pub use consolidation::{ConsolidationReport, MergeRecord};
pub use importance::ImportanceDecayReport;
pub use sessions::SessionTracker;
pub use store::EpisodicStore;
