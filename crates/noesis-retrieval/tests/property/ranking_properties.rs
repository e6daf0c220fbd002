use std::sync::Arc;

use noesis_core::config::RankingConfig;
use noesis_core::models::{QueryContext, Strategy as RetrievalStrategy};
use noesis_retrieval::{Candidate, Ranker};
use proptest::prelude::*;
use test_fixtures::{snapshot, FragmentBuilder};

#[derive(Debug, Clone)]
struct Seed {
    id: u8,
    authority: f64,
    quality: f64,
    window: (f64, f64),
    evidence: f64,
    vector: [f32; 3],
}

fn seed() -> impl Strategy<Value = Seed> {
    (
        any::<u8>(),
        0.0f64..=1.0,
        0.0f64..=1.0,
        (0.0f64..=1.0, 0.0f64..=1.0),
        0.0f64..=1.0,
        prop::array::uniform3(-1.0f32..=1.0),
    )
        .prop_map(|(id, authority, quality, (a, b), evidence, vector)| Seed {
            id,
            authority,
            quality,
            window: (a.min(b), a.max(b)),
            evidence,
            vector,
        })
}

fn build(seeds: &[Seed]) -> Vec<Candidate> {
    seeds
        .iter()
        .map(|s| {
            let fragment = FragmentBuilder::new(&format!("f{:03}", s.id), "content")
                .authority(s.authority)
                .quality(s.quality)
                .window(0.0, s.window.0, s.window.1)
                .embedding(s.vector.to_vec(), "m");
            Candidate::new(Arc::new(fragment), RetrievalStrategy::Keyword, s.evidence)
        })
        .collect()
}

proptest! {
    // ── Same input, same order, whatever the input order ──
    #[test]
    fn ranking_is_deterministic(
        seeds in proptest::collection::vec(seed(), 0..24),
        level in 0.0f64..=1.0,
        with_embedding in any::<bool>(),
    ) {
        let mut seeds = seeds;
        seeds.sort_by_key(|s| s.id);
        seeds.dedup_by_key(|s| s.id);
        let ranker = Ranker::new(&RankingConfig::default()).unwrap();
        let query = QueryContext::new("q", snapshot(1, level)).with_max_results(50);
        let embedding = [0.5f32, -0.25, 1.0];
        let embedding = with_embedding.then_some(&embedding[..]);

        let forward = build(&seeds);
        let mut reversed = forward.clone();
        reversed.reverse();

        let a = ranker.rank(&forward, &query, embedding);
        let b = ranker.rank(&reversed, &query, embedding);
        let ids_a: Vec<&str> = a.iter().map(|c| c.id()).collect();
        let ids_b: Vec<&str> = b.iter().map(|c| c.id()).collect();
        prop_assert_eq!(ids_a, ids_b);

        for pair in a.windows(2) {
            prop_assert!(pair[0].final_score >= pair[1].final_score);
        }
        for item in &a {
            for factor in item.breakdown.as_array() {
                prop_assert!((0.0..=1.0).contains(&factor));
            }
        }
    }
}
