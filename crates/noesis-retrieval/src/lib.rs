//! # noesis-retrieval
//!
//! Retrieval strategies, the concurrent strategy runner, candidate merge
//! and the six-factor ranking function.

pub mod budget;
pub mod engine;
pub mod ranking;
pub mod search;
pub mod strategies;

pub use budget::Allotment;
pub use engine::{RetrievalEngine, RetrievalOutcome};
pub use ranking::Ranker;
pub use search::{Candidate, CandidatePool, RetrievalSources};
