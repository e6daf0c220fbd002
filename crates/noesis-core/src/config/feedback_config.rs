use serde::{Deserialize, Serialize};

use super::defaults;

/// Feedback loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Signal change produced by a maximally positive or negative feedback.
    pub step: f64,
    /// Upper bound on the magnitude of a single signal delta.
    pub max_signal_delta: f64,
    /// Rolling feedback scores kept per fragment.
    pub history: usize,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            step: defaults::DEFAULT_FEEDBACK_STEP,
            max_signal_delta: defaults::DEFAULT_MAX_SIGNAL_DELTA,
            history: defaults::DEFAULT_FEEDBACK_HISTORY,
        }
    }
}
