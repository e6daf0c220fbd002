//! Candidate gathering plumbing shared by the strategies.

pub mod context;
pub mod merge;

pub use context::{RetrievalSources, StrategyContext};
pub use merge::{Candidate, CandidatePool, CandidateSink};
