//! Embedding migration after a provider change.
//!
//! The store flags every fragment embedded by another model as stale; the
//! worker re-embeds them in batches and re-indexes them. Stale fragments are
//! not retrieved by similarity until migrated.

pub mod progress;
pub mod worker;

pub use progress::{MigrationProgress, MigrationStatus, ProgressSnapshot};
pub use worker::{prioritize, MigrationReport, MigrationWorker, WorkerConfig};
