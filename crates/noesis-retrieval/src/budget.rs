//! Splits a request's time budget across its strategies.

use std::collections::BTreeMap;
use std::time::Duration;

use noesis_core::errors::{NoesisError, NoesisResult, RetrievalError};
use noesis_core::models::Strategy;

/// One strategy to run and the share of the budget it gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allotment {
    pub strategy: Strategy,
    pub budget: Duration,
}

/// Each distinct strategy runs once, in order of first appearance.
///
/// Without `weights`, the budget is split evenly per requested entry, so a
/// strategy listed twice gets twice the share. With `weights`, a strategy's
/// share is its weight over the sum; strategies missing from the map weigh
/// their occurrence count.
pub fn allot(
    requested: &[Strategy],
    weights: Option<&BTreeMap<Strategy, f64>>,
    total: Duration,
) -> NoesisResult<Vec<Allotment>> {
    if requested.is_empty() {
        return Err(RetrievalError::NoStrategies.into());
    }

    let mut order: Vec<(Strategy, f64)> = Vec::new();
    for strategy in requested {
        match order.iter_mut().find(|(s, _)| s == strategy) {
            Some((_, count)) => *count += 1.0,
            None => order.push((*strategy, 1.0)),
        }
    }

    if let Some(weights) = weights {
        for (strategy, share) in order.iter_mut() {
            if let Some(w) = weights.get(strategy) {
                if !w.is_finite() || *w < 0.0 {
                    return Err(NoesisError::InvalidWeights {
                        reason: format!("budget weight {w} for {strategy} is negative or not finite"),
                    });
                }
                *share = *w;
            }
        }
    }

    let sum: f64 = order.iter().map(|(_, share)| share).sum();
    let even = 1.0 / order.len() as f64;
    Ok(order
        .into_iter()
        .map(|(strategy, share)| Allotment {
            strategy,
            budget: total.mul_f64(if sum > 0.0 { share / sum } else { even }),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOTAL: Duration = Duration::from_millis(1200);

    fn ms(d: Duration) -> f64 {
        d.as_secs_f64() * 1000.0
    }

    fn close(d: Duration, expected_ms: f64) -> bool {
        (ms(d) - expected_ms).abs() < 1e-3
    }

    #[test]
    fn even_split() {
        let plan = allot(&[Strategy::Semantic, Strategy::Keyword], None, TOTAL).unwrap();
        assert_eq!(plan.len(), 2);
        assert!(plan.iter().all(|a| close(a.budget, 600.0)));
    }

    #[test]
    fn duplicates_get_extra_share_and_run_once() {
        let plan = allot(
            &[Strategy::Semantic, Strategy::Keyword, Strategy::Semantic],
            None,
            TOTAL,
        )
        .unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].strategy, Strategy::Semantic);
        assert!(close(plan[0].budget, 800.0));
        assert!(close(plan[1].budget, 400.0));
    }

    #[test]
    fn explicit_weights_override_counts() {
        let weights = BTreeMap::from([(Strategy::Semantic, 1.0), (Strategy::Keyword, 3.0)]);
        let plan = allot(
            &[Strategy::Semantic, Strategy::Keyword],
            Some(&weights),
            TOTAL,
        )
        .unwrap();
        assert!(close(plan[0].budget, 300.0));
        assert!(close(plan[1].budget, 900.0));
    }

    #[test]
    fn zero_weights_fall_back_to_even() {
        let weights = BTreeMap::from([(Strategy::Semantic, 0.0), (Strategy::Keyword, 0.0)]);
        let plan = allot(
            &[Strategy::Semantic, Strategy::Keyword],
            Some(&weights),
            TOTAL,
        )
        .unwrap();
        assert!(plan.iter().all(|a| close(a.budget, 600.0)));
    }

    #[test]
    fn negative_weight_rejected() {
        let weights = BTreeMap::from([(Strategy::Semantic, -1.0)]);
        let err = allot(&[Strategy::Semantic], Some(&weights), TOTAL).unwrap_err();
        assert!(matches!(err, NoesisError::InvalidWeights { .. }));
    }

    #[test]
    fn empty_request_rejected() {
        let err = allot(&[], None, TOTAL).unwrap_err();
        assert!(matches!(
            err,
            NoesisError::Retrieval(RetrievalError::NoStrategies)
        ));
    }
}
