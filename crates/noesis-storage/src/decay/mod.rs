//! Recency decay.
//!
//! `recency *= 0.5^(elapsed / half_life)` where `elapsed` runs from the later
//! of the last access and the previous decay pass. The factor never exceeds
//! 1.0, so repeated passes are monotonically non-increasing.

mod formula;

pub use formula::{decay_factor, decayed_recency};

/// Outcome of one decay pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecayReport {
    /// Fragments examined.
    pub processed: usize,
    /// Fragments whose recency actually dropped.
    pub decayed: usize,
    /// Fragments skipped because of a per-item failure.
    pub skipped: Vec<String>,
}
