use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use noesis_core::config::EpisodicConfig;
use noesis_core::errors::{EpisodeError, NoesisError, NoesisResult};
use noesis_core::models::{Episode, EpisodeState, StateSnapshot};
use noesis_core::traits::IEmbeddingProvider;
use noesis_index::{Filter, Metadata, MetadataValue, VectorIndex};
use tracing::{debug, info, warn};

use crate::consolidation::{self, ConsolidationReport, MergeRecord};
use crate::importance::{self, ImportanceDecayReport};
use crate::sessions::SessionTracker;

/// Releases the consolidation guard on drop, including early returns.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Owns closed episodes and their index entries.
pub struct EpisodicStore {
    sessions: SessionTracker,
    episodes: DashMap<String, Arc<Episode>>,
    /// Time of the last importance decay per episode.
    decay_marks: DashMap<String, DateTime<Utc>>,
    index: Arc<VectorIndex>,
    provider: Arc<dyn IEmbeddingProvider>,
    collection: String,
    config: EpisodicConfig,
    /// Guard: only one consolidation pass at a time.
    is_consolidating: Arc<AtomicBool>,
}

impl EpisodicStore {
    /// Creates the episode collection in `index` if needed.
    pub fn new(
        index: Arc<VectorIndex>,
        provider: Arc<dyn IEmbeddingProvider>,
        collection: impl Into<String>,
        config: EpisodicConfig,
    ) -> NoesisResult<Self> {
        let collection = collection.into();
        index.create_collection(&collection, provider.dimensions())?;
        Ok(Self {
            sessions: SessionTracker::new(),
            episodes: DashMap::new(),
            decay_marks: DashMap::new(),
            index,
            provider,
            collection,
            config,
            is_consolidating: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn sessions(&self) -> &SessionTracker {
        &self.sessions
    }

    pub fn config(&self) -> &EpisodicConfig {
        &self.config
    }

    // ── Open sessions ──

    pub fn open_session(&self, session_id: &str, user_id: &str, at: DateTime<Utc>) -> NoesisResult<()> {
        self.sessions.open(session_id, user_id, at)?;
        debug!(session_id, user_id, "session opened");
        Ok(())
    }

    pub fn record_sample(&self, session_id: &str, at: DateTime<Utc>, level: f64) -> NoesisResult<()> {
        self.sessions.record_sample(session_id, at, level)
    }

    pub fn record_access(&self, session_id: &str, fragment_id: &str) -> NoesisResult<()> {
        self.sessions.record_access(session_id, fragment_id)
    }

    pub fn record_interaction(&self, session_id: &str, text: &str) -> NoesisResult<()> {
        self.sessions.record_interaction(session_id, text)
    }

    /// Recent interaction text of the user's open session, if any.
    pub fn recent_summary(&self, user_id: &str) -> Option<String> {
        self.sessions
            .recent_summary(user_id, self.config.recent_interactions)
    }

    /// Close a session: embed it, score its importance and index it.
    ///
    /// The session stays open if embedding or indexing fails.
    pub fn close_session(&self, session_id: &str, ended_at: DateTime<Utc>) -> NoesisResult<Arc<Episode>> {
        let mut episode = self
            .sessions
            .get(session_id)
            .ok_or_else(|| NoesisError::not_found("session", session_id))?;
        episode.ended_at = Some(ended_at);
        episode
            .validate()
            .map_err(|reason| EpisodeError::InvalidEpisode {
                id: episode.id.clone(),
                reason,
            })?;

        episode.embedding = self.embed_episode(&episode)?;
        episode.importance = importance::initial_importance(&episode);
        episode.state = EpisodeState::Closed;

        self.index_episode(&episode)?;
        self.sessions.remove(session_id);
        let episode = Arc::new(episode);
        self.episodes.insert(episode.id.clone(), Arc::clone(&episode));
        info!(
            episode_id = %episode.id,
            user_id = %episode.user_id,
            importance = episode.importance,
            samples = episode.trajectory.len(),
            "episode closed"
        );
        Ok(episode)
    }

    fn embed_episode(&self, episode: &Episode) -> NoesisResult<Vec<f32>> {
        let mut text = episode.interactions.join(" ");
        if text.trim().is_empty() {
            text = episode
                .accessed_fragments
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(" ");
        }
        let state = episode.mean_level().map(|level| {
            StateSnapshot::new(0, level).with_dynamics(episode.level_variance().sqrt(), 0.0)
        });
        self.provider.embed(&text, state.as_ref())
    }

    fn index_episode(&self, episode: &Episode) -> NoesisResult<()> {
        let mut metadata = Metadata::new();
        metadata.insert("user_id".into(), episode.user_id.clone().into());
        metadata.insert("state".into(), episode.state.label().into());
        metadata.insert("importance".into(), MetadataValue::Number(episode.importance));
        metadata.insert(
            "ended_at".into(),
            MetadataValue::Number(episode.window_end().timestamp() as f64),
        );
        self.index
            .upsert(&self.collection, &episode.id, episode.embedding.clone(), metadata)
    }

    // ── Closed episodes ──

    pub fn get(&self, id: &str) -> NoesisResult<Arc<Episode>> {
        self.episodes
            .get(id)
            .map(|e| Arc::clone(e.value()))
            .ok_or_else(|| NoesisError::not_found("episode", id))
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    /// Closed episodes of `user_id`, sorted by id.
    pub fn live_for_user(&self, user_id: &str) -> Vec<Arc<Episode>> {
        let mut out: Vec<Arc<Episode>> = self
            .episodes
            .iter()
            .filter(|e| e.value().user_id == user_id && e.value().state.is_live())
            .map(|e| Arc::clone(e.value()))
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// Embed a similarity query with the provider episodes are embedded with.
    pub fn embed_query(&self, text: &str, state: Option<&StateSnapshot>) -> NoesisResult<Vec<f32>> {
        self.provider.embed(text, state)
    }

    /// The user's closed episodes most similar to `query`, with cosine similarity.
    pub fn search_similar(
        &self,
        user_id: &str,
        query: &[f32],
        k: usize,
    ) -> NoesisResult<Vec<(Arc<Episode>, f64)>> {
        let filters = [
            Filter::eq("user_id", user_id),
            Filter::eq("state", EpisodeState::Closed.label()),
        ];
        let hits = self.index.search(&self.collection, query, k, &filters)?;
        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                let episode = self.episodes.get(&hit.id).map(|e| Arc::clone(e.value()))?;
                episode.state.is_live().then_some((episode, hit.similarity))
            })
            .collect())
    }

    fn replace(&self, episode: Episode) -> Arc<Episode> {
        let episode = Arc::new(episode);
        self.episodes.insert(episode.id.clone(), Arc::clone(&episode));
        episode
    }

    /// Append feedback in [0, 1] to a closed episode and adjust its importance
    /// by the change in its feedback share. Decay and consolidation bonuses
    /// already applied are kept.
    pub fn rescore(&self, episode_id: &str, feedback: f64) -> NoesisResult<f64> {
        let current = self.get(episode_id)?;
        if !current.state.is_live() {
            return Err(EpisodeError::NotMutable {
                id: episode_id.to_string(),
                state: current.state.label().to_string(),
            }
            .into());
        }
        if !feedback.is_finite() || !(0.0..=1.0).contains(&feedback) {
            return Err(EpisodeError::InvalidEpisode {
                id: episode_id.to_string(),
                reason: format!("feedback {feedback} outside [0, 1]"),
            }
            .into());
        }
        let mut next = Episode::clone(&current);
        next.feedback_scores.push(feedback);
        next.importance = importance::rescored_importance(current.importance, &current, &next);
        self.index_episode(&next)?;
        let next = self.replace(next);
        debug!(episode_id, importance = next.importance, "episode rescored");
        Ok(next.importance)
    }

    // ── Decay ──

    /// Halve importance per half-life since the later of the episode end and
    /// the previous pass; retire episodes that fall below the retention threshold.
    pub fn decay_importance(&self, now: DateTime<Utc>) -> ImportanceDecayReport {
        let mut report = ImportanceDecayReport::default();
        let mut ids: Vec<String> = self
            .episodes
            .iter()
            .filter(|e| e.value().state.is_live())
            .map(|e| e.key().clone())
            .collect();
        ids.sort();

        for id in ids {
            report.processed += 1;
            match self.decay_one(&id, now) {
                Ok(Some(retired)) => {
                    report.decayed += 1;
                    if retired {
                        report.retired.push(id);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(episode_id = %id, error = %e, "importance decay skipped episode");
                    report.skipped.push(id);
                }
            }
        }
        info!(
            processed = report.processed,
            decayed = report.decayed,
            retired = report.retired.len(),
            skipped = report.skipped.len(),
            "importance decay pass complete"
        );
        report
    }

    /// `Ok(None)` when nothing elapsed; otherwise whether the episode was retired.
    fn decay_one(&self, id: &str, now: DateTime<Utc>) -> NoesisResult<Option<bool>> {
        let current = self.get(id)?;
        if !current.state.is_live() {
            return Ok(None);
        }
        let since = self
            .decay_marks
            .get(id)
            .map(|m| *m.value())
            .filter(|m| *m > current.window_end())
            .unwrap_or_else(|| current.window_end());
        if now <= since {
            return Ok(None);
        }

        let mut next = Episode::clone(&current);
        next.importance = importance::decayed_importance(
            current.importance,
            since,
            now,
            self.config.importance_half_life_days,
        );
        let retire = next.importance < self.config.retention_threshold;
        if retire {
            next.state = EpisodeState::Retired;
            self.index.remove(&self.collection, id)?;
        } else {
            self.index_episode(&next)?;
        }
        self.replace(next);
        self.decay_marks.insert(id.to_string(), now);
        if retire {
            info!(episode_id = id, "episode retired");
        }
        Ok(Some(retire))
    }

    // ── Consolidation ──

    pub fn is_consolidating(&self) -> bool {
        self.is_consolidating.load(Ordering::Relaxed)
    }

    /// Merge similar, temporally proximate closed episodes of the same user.
    ///
    /// Each episode takes part in at most one merge per pass. Fails with
    /// `ConsolidationInProgress` when another pass is running.
    pub fn consolidate(&self) -> NoesisResult<ConsolidationReport> {
        if self
            .is_consolidating
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(EpisodeError::ConsolidationInProgress.into());
        }
        let _guard = RunningGuard(&self.is_consolidating);

        let mut live: Vec<Episode> = self
            .episodes
            .iter()
            .filter(|e| e.value().state.is_live())
            .map(|e| Episode::clone(e.value()))
            .collect();
        live.sort_by(|a, b| a.id.cmp(&b.id));

        let mut report = ConsolidationReport {
            examined: live.len(),
            ..Default::default()
        };
        let candidates = consolidation::find_candidates(&live, &self.config);
        let mut touched = std::collections::BTreeSet::new();

        for candidate in candidates {
            if touched.contains(&candidate.a) || touched.contains(&candidate.b) {
                continue;
            }
            match self.merge_pair(&candidate.a, &candidate.b) {
                Ok((successor, absorbed)) => {
                    touched.insert(candidate.a.clone());
                    touched.insert(candidate.b.clone());
                    debug!(%successor, %absorbed, similarity = candidate.similarity, "episodes merged");
                    report.merges.push(MergeRecord {
                        successor,
                        absorbed,
                        similarity: candidate.similarity,
                    });
                }
                Err(e) => {
                    warn!(a = %candidate.a, b = %candidate.b, error = %e, "consolidation skipped pair");
                    report.skipped.push((candidate.a.clone(), e.to_string()));
                }
            }
        }

        info!(
            examined = report.examined,
            merged = report.merges.len(),
            skipped = report.skipped.len(),
            "consolidation pass complete"
        );
        Ok(report)
    }

    fn merge_pair(&self, a: &str, b: &str) -> NoesisResult<(String, String)> {
        let (a, b) = (self.get(a)?, self.get(b)?);
        for ep in [&a, &b] {
            if !ep.state.is_live() {
                return Err(EpisodeError::NotMutable {
                    id: ep.id.clone(),
                    state: ep.state.label().to_string(),
                }
                .into());
            }
        }
        let (successor, absorbed) = consolidation::order_pair(&a, &b);
        let (merged, retired) =
            consolidation::merge(successor, absorbed, self.config.corroboration_bonus);

        self.index_episode(&merged)?;
        self.index.remove(&self.collection, &retired.id)?;
        let ids = (merged.id.clone(), retired.id.clone());
        self.replace(merged);
        self.replace(retired);
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use test_fixtures::FakeProvider;

    fn store() -> EpisodicStore {
        let index = Arc::new(VectorIndex::new());
        EpisodicStore::new(
            index,
            Arc::new(FakeProvider::standard()),
            "episodes",
            EpisodicConfig::default(),
        )
        .unwrap()
    }

    fn close(store: &EpisodicStore, session: &str, user: &str, start: DateTime<Utc>, text: &str) -> Arc<Episode> {
        store.open_session(session, user, start).unwrap();
        store.record_sample(session, start + Duration::minutes(1), 0.3).unwrap();
        store.record_sample(session, start + Duration::minutes(2), 0.7).unwrap();
        store.record_interaction(session, text).unwrap();
        store.close_session(session, start + Duration::minutes(10)).unwrap()
    }

    #[test]
    fn close_session_indexes_and_scores() {
        let s = store();
        let ep = close(&s, "s1", "u1", Utc::now(), "breathing practice");
        assert_eq!(ep.state, EpisodeState::Closed);
        assert!(ep.importance > 0.0);
        assert!(!s.sessions().is_open("s1"));
        let hits = s.search_similar("u1", &ep.embedding, 5).unwrap();
        assert_eq!(hits[0].0.id, ep.id);
        assert!(s.search_similar("u2", &ep.embedding, 5).unwrap().is_empty());
    }

    #[test]
    fn close_with_end_before_start_keeps_session_open() {
        let s = store();
        let now = Utc::now();
        s.open_session("s1", "u1", now).unwrap();
        let err = s.close_session("s1", now - Duration::minutes(1)).unwrap_err();
        assert!(matches!(err, NoesisError::Episode(EpisodeError::InvalidEpisode { .. })));
        assert!(s.sessions().is_open("s1"));
    }

    #[test]
    fn rescore_only_touches_closed() {
        let s = store();
        let ep = close(&s, "s1", "u1", Utc::now(), "focus");
        let before = ep.importance;
        let after = s.rescore(&ep.id, 1.0).unwrap();
        assert!(after > before);
        assert!(s.rescore(&ep.id, 2.0).is_err());
    }

    #[test]
    fn decay_retires_below_threshold_and_unindexes() {
        let s = store();
        let start = Utc::now() - Duration::days(400);
        let ep = close(&s, "s1", "u1", start, "focus");
        let report = s.decay_importance(Utc::now());
        assert_eq!(report.retired, vec![ep.id.clone()]);
        assert_eq!(s.get(&ep.id).unwrap().state, EpisodeState::Retired);
        assert!(s.search_similar("u1", &ep.embedding, 5).unwrap().is_empty());
        assert!(s.rescore(&ep.id, 1.0).is_err());
    }

    #[test]
    fn repeated_decay_does_not_compound_elapsed_time() {
        let s = store();
        let start = Utc::now() - Duration::days(1);
        let ep = close(&s, "s1", "u1", start, "focus");
        let now = Utc::now();
        s.decay_importance(now);
        let once = s.get(&ep.id).unwrap().importance;
        s.decay_importance(now);
        assert_eq!(s.get(&ep.id).unwrap().importance, once);
    }

    #[test]
    fn overlapping_pass_is_rejected() {
        let s = store();
        s.is_consolidating.store(true, Ordering::SeqCst);
        assert!(matches!(
            s.consolidate(),
            Err(NoesisError::Episode(EpisodeError::ConsolidationInProgress))
        ));
        s.is_consolidating.store(false, Ordering::SeqCst);
        assert!(s.consolidate().is_ok());
        assert!(!s.is_consolidating());
    }
}
