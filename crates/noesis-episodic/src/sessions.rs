//! Open-session tracking via `DashMap`.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use noesis_core::errors::{EpisodeError, NoesisError, NoesisResult};
use noesis_core::models::{Episode, TrajectorySample};
use uuid::Uuid;

/// Open sessions keyed by session id. Memory only.
#[derive(Debug, Default)]
pub struct SessionTracker {
    sessions: DashMap<String, Episode>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session. Every session gets a fresh episode id, so reusing a
    /// session id after it closed starts a new episode.
    pub fn open(
        &self,
        session_id: &str,
        user_id: &str,
        started_at: DateTime<Utc>,
    ) -> NoesisResult<()> {
        use dashmap::mapref::entry::Entry;
        match self.sessions.entry(session_id.to_string()) {
            Entry::Occupied(_) => Err(EpisodeError::SessionAlreadyOpen {
                session_id: session_id.to_string(),
            }
            .into()),
            Entry::Vacant(slot) => {
                slot.insert(Episode::open(
                    format!("ep-{}", Uuid::new_v4()),
                    user_id,
                    session_id,
                    started_at,
                ));
                Ok(())
            }
        }
    }

    fn with_session<T>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut Episode) -> NoesisResult<T>,
    ) -> NoesisResult<T> {
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| NoesisError::not_found("session", session_id))?;
        f(entry.value_mut())
    }

    /// Append a trajectory sample. Samples must be strictly increasing in time
    /// and not precede the session start.
    pub fn record_sample(&self, session_id: &str, at: DateTime<Utc>, level: f64) -> NoesisResult<()> {
        self.with_session(session_id, |ep| {
            let invalid = |reason: String| EpisodeError::InvalidEpisode {
                id: ep.id.clone(),
                reason,
            };
            if !(0.0..=1.0).contains(&level) {
                return Err(invalid(format!("state-level {level} outside [0, 1]")).into());
            }
            if at < ep.started_at {
                return Err(invalid(format!("sample at {at} precedes session start")).into());
            }
            if let Some(last) = ep.trajectory.last() {
                if at <= last.at {
                    return Err(invalid(format!("sample at {at} does not follow {}", last.at)).into());
                }
            }
            ep.trajectory.push(TrajectorySample { at, level });
            Ok(())
        })
    }

    pub fn record_access(&self, session_id: &str, fragment_id: &str) -> NoesisResult<()> {
        self.with_session(session_id, |ep| {
            ep.accessed_fragments.insert(fragment_id.to_string());
            Ok(())
        })
    }

    pub fn record_interaction(&self, session_id: &str, text: &str) -> NoesisResult<()> {
        self.with_session(session_id, |ep| {
            ep.interactions.push(text.to_string());
            Ok(())
        })
    }

    /// The last `n` interactions of the user's most recently started open session.
    pub fn recent_summary(&self, user_id: &str, n: usize) -> Option<String> {
        let latest = self
            .sessions
            .iter()
            .filter(|e| e.value().user_id == user_id)
            .max_by(|a, b| {
                a.value()
                    .started_at
                    .cmp(&b.value().started_at)
                    .then_with(|| b.key().cmp(a.key()))
            })
            .map(|e| e.value().interactions.clone())?;
        let start = latest.len().saturating_sub(n);
        let summary = latest[start..].join(" ");
        (!summary.trim().is_empty()).then_some(summary)
    }

    /// Cloned view of an open session.
    pub fn get(&self, session_id: &str) -> Option<Episode> {
        self.sessions.get(session_id).map(|e| e.value().clone())
    }

    pub(crate) fn remove(&self, session_id: &str) -> Option<Episode> {
        self.sessions.remove(session_id).map(|(_, ep)| ep)
    }

    pub fn is_open(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
