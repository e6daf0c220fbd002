use noesis_index::{Metadata, VectorIndex};
use proptest::prelude::*;

fn vector() -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0, 4)
}

proptest! {
    #[test]
    fn removed_ids_never_come_back(
        entries in proptest::collection::btree_map("[a-f]{1,3}", vector(), 1..20),
        query in vector(),
        removals in 1usize..3,
    ) {
        let index = VectorIndex::new();
        index.create_collection("documents", 4).unwrap();
        for (id, v) in &entries {
            index.upsert("documents", id, v.clone(), Metadata::new()).unwrap();
        }
        let victim = entries.keys().next().unwrap().clone();
        for _ in 0..removals {
            index.remove("documents", &victim).unwrap();
        }
        prop_assert_eq!(index.len("documents").unwrap(), entries.len() - 1);
        let hits = index.search("documents", &query, entries.len(), &[]).unwrap();
        prop_assert!(hits.iter().all(|h| h.id != victim));
    }

    #[test]
    fn search_is_sorted_and_bounded(
        entries in proptest::collection::btree_map("[a-z]{1,4}", vector(), 0..30),
        query in vector(),
        k in 0usize..10,
    ) {
        let index = VectorIndex::new();
        index.create_collection("documents", 4).unwrap();
        for (id, v) in &entries {
            index.upsert("documents", id, v.clone(), Metadata::new()).unwrap();
        }
        let hits = index.search("documents", &query, k, &[]).unwrap();
        prop_assert!(hits.len() <= k.min(entries.len()));
        for pair in hits.windows(2) {
            prop_assert!(
                pair[0].similarity > pair[1].similarity
                    || (pair[0].similarity == pair[1].similarity && pair[0].id < pair[1].id)
            );
        }
    }
}
