/// Retrieval subsystem errors.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("strategy {strategy} failed: {reason}")]
    StrategyFailed { strategy: String, reason: String },

    #[error("no strategies requested")]
    NoStrategies,

    #[error("strategy task panicked: {reason}")]
    TaskPanicked { reason: String },
}
