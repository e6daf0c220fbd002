use noesis_core::traits::IEmbeddingProvider;
use noesis_storage::KnowledgeStore;
use test_fixtures::{load_corpus, FakeProvider};

fn loaded() -> (KnowledgeStore, FakeProvider) {
    let provider = FakeProvider::standard();
    let store = KnowledgeStore::new(provider.model_id(), provider.dimensions());
    for fragment in load_corpus(&provider) {
        store.put(fragment).unwrap();
    }
    (store, provider)
}

// ── put then get returns identical content and metadata ──

#[test]
fn put_then_get_is_identical() {
    let provider = FakeProvider::standard();
    let store = KnowledgeStore::new(provider.model_id(), provider.dimensions());
    for fragment in load_corpus(&provider) {
        let expected = fragment.clone();
        store.put(fragment).unwrap();
        let got = store.get(&expected.id).unwrap();
        assert_eq!(*got, expected);
    }
    assert_eq!(store.len(), 6);
}

#[test]
fn put_overwrites_and_reindexes_terms() {
    let (store, provider) = loaded();
    let mut changed = (*store.get("frag-cooking").unwrap()).clone();
    changed.content = "Slow fermentation makes sourdough bread".into();
    changed.title = "Sourdough".into();
    changed.embedding = provider.embed(&changed.embedding_text(), None).unwrap();
    store.put(changed).unwrap();

    assert!(store.lexical_search("pasta", 5).is_empty());
    assert_eq!(store.lexical_search("sourdough", 5)[0].0, "frag-cooking");
}

#[test]
fn keyword_search_finds_shared_terms() {
    let (store, _) = loaded();
    let hits = store.lexical_search("attention resources", 10);
    assert_eq!(hits[0].0, "frag-attention");
    assert!(hits.iter().any(|(id, _)| id == "frag-populations"));
}

#[test]
fn related_expands_by_domain_and_tags() {
    let (store, _) = loaded();
    let seed = store.get("frag-integration").unwrap();
    let related: Vec<String> = store.related(&seed, 3).iter().map(|f| f.id.clone()).collect();
    assert_eq!(related, vec!["frag-populations".to_string()]);
}
