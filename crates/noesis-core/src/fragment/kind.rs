use serde::{Deserialize, Serialize};

/// Fragment kind with its closed, per-kind metadata schema.
///
/// Unknown fields are rejected at deserialization time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum FragmentKind {
    Document {
        source_uri: String,
        section: Option<String>,
    },
    PriorInteraction {
        session_id: String,
        turn: u32,
    },
    StateSnapshot {
        snapshot_version: u64,
        captured_level: f64,
    },
    EpisodicSummary {
        episode_id: String,
    },
    LearningMaterial {
        curriculum: String,
        prerequisites: Vec<String>,
    },
    DomainContent {
        source: String,
    },
}

impl FragmentKind {
    /// Stable snake_case label, also used as index metadata.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Document { .. } => "document",
            Self::PriorInteraction { .. } => "prior_interaction",
            Self::StateSnapshot { .. } => "state_snapshot",
            Self::EpisodicSummary { .. } => "episodic_summary",
            Self::LearningMaterial { .. } => "learning_material",
            Self::DomainContent { .. } => "domain_content",
        }
    }

    /// Kind-specific validation beyond what the type system expresses.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Document { source_uri, .. } if source_uri.trim().is_empty() => {
                Err("document source_uri is empty".into())
            }
            Self::PriorInteraction { session_id, .. } if session_id.trim().is_empty() => {
                Err("prior_interaction session_id is empty".into())
            }
            Self::StateSnapshot { captured_level, .. }
                if !(0.0..=1.0).contains(captured_level) =>
            {
                Err(format!("state_snapshot level {captured_level} outside [0, 1]"))
            }
            Self::EpisodicSummary { episode_id } if episode_id.trim().is_empty() => {
                Err("episodic_summary episode_id is empty".into())
            }
            _ => Ok(()),
        }
    }
}
