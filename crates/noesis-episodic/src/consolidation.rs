//! Pair selection and merge rules for episode consolidation.

use chrono::Duration;
use noesis_core::config::EpisodicConfig;
use noesis_core::models::{Episode, EpisodeState};
use noesis_core::similarity::{cosine_similarity, weighted_average};

/// One merge performed by a consolidation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeRecord {
    pub successor: String,
    pub absorbed: String,
    pub similarity: f64,
}

/// Outcome of one consolidation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsolidationReport {
    /// Closed episodes considered.
    pub examined: usize,
    pub merges: Vec<MergeRecord>,
    /// `(episode id, reason)` for candidate pairs that could not be merged.
    pub skipped: Vec<(String, String)>,
}

/// A mergeable pair, `a.id < b.id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub a: String,
    pub b: String,
    pub similarity: f64,
}

/// Whether two episodes may be merged under `config`.
pub fn is_mergeable(a: &Episode, b: &Episode, config: &EpisodicConfig) -> Option<f64> {
    if a.id == b.id || a.user_id != b.user_id {
        return None;
    }
    if a.state != EpisodeState::Closed || b.state != EpisodeState::Closed {
        return None;
    }
    let proximity = Duration::milliseconds((config.consolidation_proximity_hours * 3_600_000.0) as i64);
    if a.gap_to(b) > proximity {
        return None;
    }
    let similarity = cosine_similarity(&a.embedding, &b.embedding);
    (similarity > config.consolidation_similarity).then_some(similarity)
}

/// All mergeable pairs among `episodes`, most similar first, ties by ids.
pub fn find_candidates(episodes: &[Episode], config: &EpisodicConfig) -> Vec<Candidate> {
    let mut out = Vec::new();
    for (i, a) in episodes.iter().enumerate() {
        for b in &episodes[i + 1..] {
            if let Some(similarity) = is_mergeable(a, b, config) {
                let (a, b) = if a.id < b.id { (a, b) } else { (b, a) };
                out.push(Candidate {
                    a: a.id.clone(),
                    b: b.id.clone(),
                    similarity,
                });
            }
        }
    }
    out.sort_by(|x, y| {
        y.similarity
            .partial_cmp(&x.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| x.a.cmp(&y.a))
            .then_with(|| x.b.cmp(&y.b))
    });
    out
}

/// Order a pair as `(successor, absorbed)`: higher importance wins, then the
/// earlier start, then the smaller id.
pub fn order_pair<'a>(x: &'a Episode, y: &'a Episode) -> (&'a Episode, &'a Episode) {
    let x_wins = match x.importance.partial_cmp(&y.importance) {
        Some(std::cmp::Ordering::Greater) => true,
        Some(std::cmp::Ordering::Less) => false,
        _ => (x.started_at, &x.id) <= (y.started_at, &y.id),
    };
    if x_wins {
        (x, y)
    } else {
        (y, x)
    }
}

/// Merge `absorbed` into `successor`, returning both new versions.
pub fn merge(successor: &Episode, absorbed: &Episode, bonus: f64) -> (Episode, Episode) {
    let mut merged = successor.clone();

    merged
        .accessed_fragments
        .extend(absorbed.accessed_fragments.iter().cloned());
    merged.interactions.extend(absorbed.interactions.iter().cloned());
    merged.feedback_scores.extend(absorbed.feedback_scores.iter().copied());

    let mut trajectory = successor.trajectory.clone();
    for sample in &absorbed.trajectory {
        if !trajectory.iter().any(|s| s.at == sample.at) {
            trajectory.push(*sample);
        }
    }
    trajectory.sort_by_key(|s| s.at);
    merged.trajectory = trajectory;

    merged.started_at = successor.started_at.min(absorbed.started_at);
    merged.ended_at = Some(successor.window_end().max(absorbed.window_end()));

    merged.embedding = weighted_average(
        &successor.embedding,
        successor.importance,
        &absorbed.embedding,
        absorbed.importance,
    );
    merged.importance = (successor.importance.max(absorbed.importance) + bonus).min(1.0);

    merged.absorbed.push(absorbed.id.clone());
    merged.absorbed.extend(absorbed.absorbed.iter().cloned());

    let mut retired = absorbed.clone();
    retired.state = EpisodeState::Consolidated {
        successor: successor.id.clone(),
    };
    (merged, retired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use test_fixtures::episode;

    fn base() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn open_episodes_never_merge() {
        let config = EpisodicConfig::default();
        let a = episode("a", "u", base(), 30, &[0.4, 0.6], &["f1"], vec![1.0, 0.0]);
        let mut b = episode("b", "u", base(), 30, &[0.4, 0.6], &["f2"], vec![1.0, 0.0]);
        b.state = EpisodeState::Open;
        assert!(is_mergeable(&a, &b, &config).is_none());
    }

    #[test]
    fn different_users_never_merge() {
        let config = EpisodicConfig::default();
        let a = episode("a", "u1", base(), 30, &[0.4], &[], vec![1.0, 0.0]);
        let b = episode("b", "u2", base(), 30, &[0.4], &[], vec![1.0, 0.0]);
        assert!(is_mergeable(&a, &b, &config).is_none());
    }

    #[test]
    fn distant_windows_never_merge() {
        let config = EpisodicConfig::default();
        let a = episode("a", "u", base(), 30, &[0.4], &[], vec![1.0, 0.0]);
        let b = episode("b", "u", base() + Duration::hours(48), 30, &[0.4], &[], vec![1.0, 0.0]);
        assert!(is_mergeable(&a, &b, &config).is_none());
    }

    #[test]
    fn dissimilar_embeddings_never_merge() {
        let config = EpisodicConfig::default();
        let a = episode("a", "u", base(), 30, &[0.4], &[], vec![1.0, 0.0]);
        let b = episode("b", "u", base(), 30, &[0.4], &[], vec![0.0, 1.0]);
        assert!(is_mergeable(&a, &b, &config).is_none());
    }

    #[test]
    fn merge_takes_union_and_bonus() {
        let mut hi = episode("hi", "u", base(), 60, &[0.2, 0.8], &["f1", "f2"], vec![1.0, 0.0]);
        hi.importance = 0.7;
        let mut lo = episode("lo", "u", base() + Duration::minutes(30), 60, &[0.5, 0.6], &["f2", "f3"], vec![0.0, 1.0]);
        lo.importance = 0.3;

        let (successor, absorbed) = order_pair(&lo, &hi);
        assert_eq!(successor.id, "hi");

        let (merged, retired) = merge(successor, absorbed, 0.05);
        assert_eq!(
            merged.accessed_fragments.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["f1", "f2", "f3"]
        );
        assert!((merged.importance - 0.75).abs() < 1e-12);
        assert_eq!(merged.absorbed, vec!["lo".to_string()]);
        assert_eq!(merged.ended_at, Some(base() + Duration::minutes(90)));
        assert!(merged.trajectory.windows(2).all(|w| w[0].at < w[1].at));
        assert!((merged.embedding[0] - 0.7).abs() < 1e-6);
        assert_eq!(
            retired.state,
            EpisodeState::Consolidated {
                successor: "hi".into()
            }
        );
    }

    #[test]
    fn importance_caps_at_one() {
        let mut a = episode("a", "u", base(), 10, &[0.5], &[], vec![1.0]);
        a.importance = 0.99;
        let b = episode("b", "u", base(), 10, &[0.5], &[], vec![1.0]);
        let (merged, _) = merge(&a, &b, 0.05);
        assert_eq!(merged.importance, 1.0);
    }

    #[test]
    fn candidates_are_sorted_by_similarity() {
        let config = EpisodicConfig::default();
        let eps = vec![
            episode("a", "u", base(), 30, &[0.4], &[], vec![1.0, 0.0]),
            episode("b", "u", base(), 30, &[0.4], &[], vec![1.0, 0.1]),
            episode("c", "u", base(), 30, &[0.4], &[], vec![1.0, 0.0]),
        ];
        let c = find_candidates(&eps, &config);
        assert_eq!(c[0].a, "a");
        assert_eq!(c[0].b, "c");
        assert_eq!(c.len(), 3);
    }
}
