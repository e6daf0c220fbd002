//! Six-factor scorer.
//!
//! Factors: relevance, state alignment, user-context match, quality,
//! recency, authority. Every factor is in [0, 1] and the final score is
//! their weighted sum.

use std::collections::BTreeMap;

use noesis_core::config::RankingWeights;
use noesis_core::models::{RelevanceSource, ScoreBreakdown, StateSnapshot, UserContext};
use noesis_core::similarity::{cosine_similarity, rescale_unit};
use noesis_core::{ApplicabilityWindow, KnowledgeFragment};

use crate::search::Candidate;

/// Discrete steps skill and difficulty are bucketed into, minus one.
const LEVEL_STEPS: f64 = 4.0;

/// Score one candidate. Returns the breakdown, final score, and where the
/// relevance factor came from.
pub fn score(
    candidate: &Candidate,
    snapshot: &StateSnapshot,
    user: Option<&UserContext>,
    query_embedding: Option<&[f32]>,
    weights: &RankingWeights,
    tolerance: f64,
    neutral: f64,
) -> (ScoreBreakdown, f64, RelevanceSource) {
    let f = &candidate.fragment;
    let (relevance, source) = relevance(query_embedding, candidate, neutral);
    let breakdown = ScoreBreakdown {
        relevance,
        state_alignment: state_alignment(
            &f.window,
            &f.population_affinity,
            snapshot,
            tolerance,
        ),
        user_context: user_context_match(f, user, neutral),
        quality: f.signals.quality,
        recency: f.signals.recency,
        authority: f.signals.authority,
    };
    let total: f64 = breakdown
        .as_array()
        .iter()
        .zip(weights.as_array())
        .map(|(factor, weight)| factor * weight)
        .sum();
    (breakdown, total, source)
}

/// Cosine against the query rescaled to [0, 1]; without a usable query
/// embedding, the best strategy evidence; with neither, `neutral`.
pub fn relevance(
    query_embedding: Option<&[f32]>,
    candidate: &Candidate,
    neutral: f64,
) -> (f64, RelevanceSource) {
    let fragment = &candidate.fragment;
    match query_embedding {
        Some(q) if q.len() == fragment.embedding.len() => (
            rescale_unit(cosine_similarity(q, &fragment.embedding)),
            RelevanceSource::Embedding,
        ),
        _ => match candidate.best_evidence() {
            Some(e) => (e, RelevanceSource::Evidence),
            None => (neutral, RelevanceSource::Neutral),
        },
    }
}

/// 0 below the fragment's minimum level, 1 inside its optimal range, and a
/// linear falloff outside it, scaled by population activity.
///
/// The falloff reaches 0 once the distance to the nearest optimal boundary
/// equals `tolerance` times the optimal range's width.
pub fn state_alignment(
    window: &ApplicabilityWindow,
    affinity: &BTreeMap<String, f64>,
    snapshot: &StateSnapshot,
    tolerance: f64,
) -> f64 {
    let level = snapshot.level;
    if level < window.min_level {
        return 0.0;
    }
    let base = if window.contains(level) {
        1.0
    } else {
        let span = tolerance * (window.optimal_high - window.optimal_low);
        if span <= 0.0 {
            0.0
        } else {
            (1.0 - window.distance(level) / span).max(0.0)
        }
    };
    base * population_scale(affinity, &snapshot.population_activity)
}

/// Affinity-weighted mean activity over populations present on both sides.
/// No overlap leaves the score unscaled.
fn population_scale(affinity: &BTreeMap<String, f64>, activity: &BTreeMap<String, f64>) -> f64 {
    let (weighted, total) = affinity
        .iter()
        .filter_map(|(population, weight)| activity.get(population).map(|a| (weight, a)))
        .fold((0.0, 0.0), |(sum, total), (weight, a)| {
            (sum + weight * a.clamp(0.0, 1.0), total + weight)
        });
    if total > 0.0 {
        (weighted / total).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Skill against fragment difficulty on five discrete levels.
///
/// Within one level scores 1.0, each further level costs a third. When the
/// user has no skill for the fragment's domain, their mean skill is used
/// and the result halved. No user scores `neutral`.
pub fn user_context_match(
    fragment: &KnowledgeFragment,
    user: Option<&UserContext>,
    neutral: f64,
) -> f64 {
    let Some(user) = user else {
        return neutral;
    };
    match user.skills.get(&fragment.domain) {
        Some(skill) => level_match(*skill, fragment.signals.complexity),
        None => match user.mean_skill() {
            Some(mean) => level_match(mean, fragment.signals.complexity) / 2.0,
            None => neutral,
        },
    }
}

fn level(x: f64) -> f64 {
    (x.clamp(0.0, 1.0) * LEVEL_STEPS).round()
}

fn level_match(skill: f64, complexity: f64) -> f64 {
    let gap = (level(skill) - level(complexity)).abs();
    if gap <= 1.0 {
        1.0
    } else {
        (1.0 - (gap - 1.0) / (LEVEL_STEPS - 1.0)).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(level: f64) -> StateSnapshot {
        StateSnapshot::new(1, level)
    }

    #[test]
    fn inside_range_is_one() {
        let w = ApplicabilityWindow::new(0.0, 0.4, 0.7);
        assert_eq!(state_alignment(&w, &BTreeMap::new(), &snapshot(0.55), 0.3), 1.0);
    }

    #[test]
    fn below_minimum_is_zero_even_near_range() {
        let w = ApplicabilityWindow::new(0.35, 0.4, 0.7);
        assert_eq!(state_alignment(&w, &BTreeMap::new(), &snapshot(0.34), 0.3), 0.0);
    }

    #[test]
    fn falloff_is_linear_then_floored() {
        let w = ApplicabilityWindow::new(0.0, 0.4, 0.8);
        // span = 0.3 * 0.4 = 0.12
        let near = state_alignment(&w, &BTreeMap::new(), &snapshot(0.86), 0.3);
        assert!((near - 0.5).abs() < 1e-9);
        assert_eq!(state_alignment(&w, &BTreeMap::new(), &snapshot(0.95), 0.3), 0.0);
    }

    #[test]
    fn falloff_scales_with_optimal_range_width() {
        // Same distance past the boundary, different range widths.
        let narrow = ApplicabilityWindow::new(0.0, 0.5, 0.6);
        let wide = ApplicabilityWindow::new(0.0, 0.2, 0.6);
        // spans 0.03 and 0.12
        assert_eq!(state_alignment(&narrow, &BTreeMap::new(), &snapshot(0.64), 0.3), 0.0);
        let score = state_alignment(&wide, &BTreeMap::new(), &snapshot(0.64), 0.3);
        assert!((score - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn population_activity_scales() {
        let w = ApplicabilityWindow::new(0.0, 0.0, 1.0);
        let affinity = BTreeMap::from([("focus".to_string(), 1.0), ("rest".to_string(), 1.0)]);
        let snap = snapshot(0.5).with_population("focus", 0.8).with_population("rest", 0.4);
        let scaled = state_alignment(&w, &affinity, &snap, 0.3);
        assert!((scaled - 0.6).abs() < 1e-9);

        let unrelated = snapshot(0.5).with_population("motor", 0.1);
        assert_eq!(state_alignment(&w, &affinity, &unrelated, 0.3), 1.0);
    }

    #[test]
    fn level_match_steps() {
        assert_eq!(level_match(0.5, 0.5), 1.0);
        assert_eq!(level_match(0.5, 0.75), 1.0);
        assert!((level_match(0.0, 0.5) - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(level_match(0.0, 1.0), 0.0);
    }
}
