//! # noesis-storage
//!
//! The knowledge store owns fragment identity and content. Fragments are held
//! as `Arc`s in a `DashMap` and replaced copy-on-write, so readers never block
//! writers and never observe a half-applied update.

pub mod decay;
mod lexical;
mod store;

pub use decay::DecayReport;
pub use store::{ActiveModel, KnowledgeStore};
