//! # noesis-rag
//!
//! The RAG orchestrator: enhances a query with state context, runs the
//! retrieval engine, ranks, and assembles the result bundle. Also owns the
//! state snapshot intake, the asynchronous feedback loop, periodic
//! maintenance and embedding migration.

pub mod enhancement;
pub mod feedback;
pub mod ingest;
pub mod intake;
pub mod migration;
pub mod orchestrator;

pub use enhancement::enhance_query;
pub use feedback::{FeedbackOutcome, FeedbackProcessor, FeedbackQueue, FeedbackStats};
pub use intake::StateIntake;
pub use migration::{MigrationProgress, MigrationReport, MigrationStatus, MigrationWorker};
pub use orchestrator::{MaintenanceReport, Orchestrator, QueryStats};
