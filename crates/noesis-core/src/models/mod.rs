mod bundle;
mod candidate;
mod degradation_event;
mod episode;
mod feedback;
mod query;
mod state;

pub use bundle::{ResultBundle, StrategyReport, StrategyStatus};
pub use candidate::{RankedCandidate, RelevanceSource, ScoreBreakdown};
pub use degradation_event::DegradationEvent;
pub use episode::{Episode, EpisodeState, TrajectorySample};
pub use feedback::FeedbackEvent;
pub use query::{QueryContext, Strategy, UserContext};
pub use state::StateSnapshot;
