use noesis_core::config::RankingWeights;
use noesis_core::errors::NoesisError;
use proptest::prelude::*;

fn weights_from(raw: [f64; 6]) -> Result<RankingWeights, NoesisError> {
    RankingWeights::new(raw[0], raw[1], raw[2], raw[3], raw[4], raw[5])
}

proptest! {
    #[test]
    fn normalized_weights_are_accepted(raw in proptest::array::uniform6(0.0f64..1.0)) {
        let sum: f64 = raw.iter().sum();
        prop_assume!(sum > 1e-3);
        let mut normalized = raw.map(|w| w / sum);
        // Push the float residue into the last slot so the sum is as close to 1.0 as possible.
        let residue = 1.0 - normalized.iter().sum::<f64>();
        normalized[5] = (normalized[5] + residue).max(0.0);
        prop_assert!(weights_from(normalized).is_ok());
    }

    #[test]
    fn off_by_more_than_epsilon_is_rejected(
        raw in proptest::array::uniform6(0.0f64..1.0),
        offset in prop_oneof![1e-5f64..0.5, -0.5f64..-1e-5],
    ) {
        let sum: f64 = raw.iter().sum();
        prop_assume!(sum > 1e-3);
        let mut weights = raw.map(|w| w / sum);
        weights[0] += offset;
        prop_assume!(weights[0] >= 0.0);
        let rejected = matches!(weights_from(weights), Err(NoesisError::InvalidWeights { .. }));
        prop_assert!(rejected);
    }

    #[test]
    fn within_epsilon_is_accepted(offset in -9e-7f64..9e-7) {
        let weights = [0.35 + offset, 0.20, 0.15, 0.15, 0.10, 0.05];
        prop_assert!(weights_from(weights).is_ok());
    }
}

#[test]
fn negative_weight_is_rejected_even_if_sum_is_one() {
    let err = weights_from([1.1, -0.1, 0.0, 0.0, 0.0, 0.0]).unwrap_err();
    assert!(matches!(err, NoesisError::InvalidWeights { .. }));
}

#[test]
fn defaults_are_valid() {
    assert!(RankingWeights::default().validate().is_ok());
}
