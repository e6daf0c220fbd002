//! # noesis-core
//!
//! Foundation crate for the Noesis retrieval engine.
//! Defines all types, traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod fragment;
pub mod models;
pub mod similarity;
pub mod text;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::NoesisConfig;
pub use errors::{NoesisError, NoesisResult};
pub use fragment::{ApplicabilityWindow, FragmentKind, KnowledgeFragment, SignalDelta, Signals};
pub use models::{
    Episode, EpisodeState, QueryContext, RankedCandidate, ScoreBreakdown, StateSnapshot, Strategy,
    UserContext,
};
pub use tokio_util::sync::CancellationToken;
