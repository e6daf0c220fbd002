//! Inverted token index used by keyword retrieval.

use std::collections::{BTreeSet, HashSet};

use dashmap::DashMap;
use noesis_core::text;

#[derive(Debug, Default)]
pub(crate) struct LexicalIndex {
    /// term → fragment ids containing it
    postings: DashMap<String, HashSet<String>>,
    /// fragment id → its term set
    documents: DashMap<String, BTreeSet<String>>,
}

impl LexicalIndex {
    pub(crate) fn insert(&self, id: &str, text: &str) {
        self.remove(id);
        let terms = text::term_set(text);
        for term in &terms {
            self.postings
                .entry(term.clone())
                .or_default()
                .insert(id.to_string());
        }
        self.documents.insert(id.to_string(), terms);
    }

    pub(crate) fn remove(&self, id: &str) {
        let Some((_, terms)) = self.documents.remove(id) else {
            return;
        };
        for term in terms {
            let now_empty = match self.postings.get_mut(&term) {
                Some(mut ids) => {
                    ids.remove(id);
                    ids.is_empty()
                }
                None => false,
            };
            if now_empty {
                self.postings.remove_if(&term, |_, ids| ids.is_empty());
            }
        }
    }

    /// Fragments sharing at least one term with `query_terms`, scored by the
    /// fraction of query terms they contain.
    pub(crate) fn score(&self, query_terms: &BTreeSet<String>) -> Vec<(String, f64)> {
        let mut candidates: BTreeSet<String> = BTreeSet::new();
        for term in query_terms {
            if let Some(ids) = self.postings.get(term) {
                candidates.extend(ids.iter().cloned());
            }
        }
        candidates
            .into_iter()
            .filter_map(|id| {
                let doc = self.documents.get(&id)?;
                let score = text::overlap_score(query_terms, doc.value());
                (score > 0.0).then_some((id, score))
            })
            .collect()
    }
}
