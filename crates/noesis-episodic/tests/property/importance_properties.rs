use chrono::{DateTime, Duration, Utc};
use noesis_episodic::importance::{decayed_importance, initial_importance, rescored_importance};
use proptest::prelude::*;
use test_fixtures::episode;

fn base() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-05-04T08:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

proptest! {
    // ── Decay never raises importance and stays in [0, 1] ──
    #[test]
    fn decay_is_monotone(
        importance in 0.0f64..=1.0,
        first in 0i64..2_000,
        second in 0i64..2_000,
        half_life in 1.0f64..365.0,
    ) {
        let since = base();
        let early = decayed_importance(importance, since, since + Duration::hours(first), half_life);
        let late = decayed_importance(importance, since, since + Duration::hours(first + second), half_life);
        prop_assert!(early <= importance + 1e-12);
        prop_assert!(late <= early + 1e-12);
        prop_assert!((0.0..=1.0).contains(&late));
    }

    // ── Feedback keeps importance in [0, 1] from any starting point ──
    #[test]
    fn rescoring_stays_bounded(
        importance in 0.0f64..=1.0,
        levels in proptest::collection::vec(0.0f64..=1.0, 1..8),
        feedback in proptest::collection::vec(0.0f64..=1.0, 1..16),
    ) {
        let mut current = episode("e", "u", base(), 30, &levels, &[], vec![1.0, 0.0]);
        let mut score = importance;
        for f in feedback {
            let mut next = current.clone();
            next.feedback_scores.push(f);
            score = rescored_importance(score, &current, &next);
            prop_assert!((0.0..=1.0).contains(&score));
            current = next;
        }
    }

    // ── On an untouched episode, rescoring equals recomputing ──
    #[test]
    fn rescoring_fresh_episode_matches_initial(
        levels in proptest::collection::vec(0.0f64..=1.0, 1..8),
        f in 0.0f64..=1.0,
    ) {
        let before = episode("e", "u", base(), 30, &levels, &[], vec![1.0, 0.0]);
        let mut after = before.clone();
        after.feedback_scores.push(f);
        let rescored = rescored_importance(initial_importance(&before), &before, &after);
        prop_assert!((rescored - initial_importance(&after)).abs() < 1e-9);
    }
}
