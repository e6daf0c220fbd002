//! Knowledge fragments: the retrievable unit of the corpus.

mod base;
mod kind;
mod signals;
mod window;

pub use base::KnowledgeFragment;
pub use kind::FragmentKind;
pub use signals::{SignalDelta, Signals};
pub use window::ApplicabilityWindow;
