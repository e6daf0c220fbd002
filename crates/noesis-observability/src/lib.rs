//! # noesis-observability
//!
//! Tracing initialisation, span macros, structured events, degradation
//! tracking and the bounded query log.

pub mod degradation;
pub mod query_log;
pub mod tracing_setup;

pub use degradation::{DegradationTracker, RecoveryStatus, TrackedDegradation};
pub use query_log::{QueryLog, QueryLogEntry};
pub use tracing_setup::init_tracing;
