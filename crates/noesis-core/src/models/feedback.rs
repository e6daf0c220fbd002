use serde::{Deserialize, Serialize};

/// Relevance feedback for one fragment.
///
/// `relevance` is in [0, 1]; 0.5 is neutral. Consumers deduplicate on
/// `event_id`, so re-delivery is harmless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub event_id: String,
    pub fragment_id: String,
    pub relevance: f64,
    pub user_id: Option<String>,
    /// Episode that consumed the fragment, if known.
    pub episode_id: Option<String>,
}

impl FeedbackEvent {
    pub fn new(
        event_id: impl Into<String>,
        fragment_id: impl Into<String>,
        relevance: f64,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            fragment_id: fragment_id.into(),
            relevance,
            user_id: None,
            episode_id: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_episode(mut self, episode_id: impl Into<String>) -> Self {
        self.episode_id = Some(episode_id.into());
        self
    }
}
