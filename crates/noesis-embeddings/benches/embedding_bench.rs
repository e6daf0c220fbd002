use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use noesis_core::models::StateSnapshot;
use noesis_core::traits::IEmbeddingProvider;
use noesis_embeddings::{CachedProvider, HashingProvider};

fn bench_hashing(c: &mut Criterion) {
    let provider = HashingProvider::new(384, 8);
    let snapshot = StateSnapshot::new(1, 0.6).with_population("focus", 0.7);
    let text = "attention gating routes limited resources toward active populations";

    c.bench_function("hashing_embed_with_state", |b| {
        b.iter(|| provider.embed(black_box(text), Some(&snapshot)))
    });

    let cached = CachedProvider::new(Arc::new(HashingProvider::new(384, 8)), 1_000);
    let _ = cached.embed(text, Some(&snapshot));
    c.bench_function("cached_embed_hit", |b| {
        b.iter(|| cached.embed(black_box(text), Some(&snapshot)))
    });
}

criterion_group!(benches, bench_hashing);
criterion_main!(benches);
