/// Episodic memory errors.
#[derive(Debug, thiserror::Error)]
pub enum EpisodeError {
    #[error("invalid episode {id}: {reason}")]
    InvalidEpisode { id: String, reason: String },

    #[error("session {session_id} is already open")]
    SessionAlreadyOpen { session_id: String },

    #[error("episode {id} is {state} and cannot be modified")]
    NotMutable { id: String, state: String },

    #[error("consolidation already in progress")]
    ConsolidationInProgress,
}
