use noesis_core::fragment::SignalDelta;
use noesis_storage::KnowledgeStore;
use proptest::prelude::*;
use test_fixtures::FragmentBuilder;

fn delta() -> impl Strategy<Value = SignalDelta> {
    (-0.25f64..=0.25, -0.25f64..=0.25, -0.25f64..=0.25)
        .prop_map(|(q, r, a)| SignalDelta::new(q, r, a))
}

fn store_with(q: f64, a: f64, r: f64) -> KnowledgeStore {
    let store = KnowledgeStore::new("m", 2);
    store
        .put(
            FragmentBuilder::new("f", "content")
                .quality(q)
                .authority(a)
                .recency(r)
                .embedding(vec![1.0, 0.0], "m"),
        )
        .unwrap();
    store
}

proptest! {
    // ── Signals stay in [0, 1] for any delta sequence ──
    #[test]
    fn signals_stay_in_unit_interval(
        start in (0.0f64..=1.0, 0.0f64..=1.0, 0.0f64..=1.0),
        deltas in proptest::collection::vec(delta(), 0..64),
    ) {
        let store = store_with(start.0, start.1, start.2);
        for d in &deltas {
            let s = store.update_signals("f", *d).unwrap();
            for v in [s.quality, s.recency, s.authority] {
                prop_assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    // ── ... in any order ──
    #[test]
    fn any_order_stays_bounded(
        deltas in proptest::collection::vec(delta(), 1..32),
        seed in any::<u64>(),
    ) {
        let mut shuffled = deltas.clone();
        // Deterministic permutation driven by the seed.
        let n = shuffled.len();
        for i in (1..n).rev() {
            let j = (seed.wrapping_mul(i as u64 + 7) % (i as u64 + 1)) as usize;
            shuffled.swap(i, j);
        }
        for order in [&deltas, &shuffled] {
            let store = store_with(0.5, 0.5, 0.5);
            for d in order.iter() {
                store.update_signals("f", *d).unwrap();
            }
            let s = store.get("f").unwrap().signals;
            prop_assert!((0.0..=1.0).contains(&s.quality));
            prop_assert!((0.0..=1.0).contains(&s.recency));
            prop_assert!((0.0..=1.0).contains(&s.authority));
        }
    }

    #[test]
    fn repeated_decay_never_increases_recency(hours in proptest::collection::vec(0i64..500, 1..10)) {
        let store = store_with(0.5, 0.5, 1.0);
        let mut now = store.get("f").unwrap().last_accessed;
        let mut previous = 1.0;
        for h in hours {
            now += chrono::Duration::hours(h);
            store.decay(now, 336.0);
            let r = store.get("f").unwrap().signals.recency;
            prop_assert!(r <= previous);
            previous = r;
        }
    }
}
