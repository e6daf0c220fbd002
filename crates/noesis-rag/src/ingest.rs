//! Index entries for knowledge fragments.

use noesis_core::errors::NoesisResult;
use noesis_core::KnowledgeFragment;
use noesis_index::{Metadata, MetadataValue, VectorIndex};

/// Metadata stored next to a fragment's vector.
pub fn fragment_metadata(fragment: &KnowledgeFragment) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("kind".into(), fragment.kind.label().into());
    metadata.insert("domain".into(), fragment.domain.clone().into());
    metadata.insert("model".into(), fragment.embedding_model.clone().into());
    metadata.insert(
        "authority".into(),
        MetadataValue::Number(fragment.signals.authority),
    );
    metadata
}

/// Upsert `fragment`'s current embedding into `collection`.
pub fn index_fragment(
    index: &VectorIndex,
    collection: &str,
    fragment: &KnowledgeFragment,
) -> NoesisResult<()> {
    index.upsert(
        collection,
        &fragment.id,
        fragment.embedding.clone(),
        fragment_metadata(fragment),
    )
}
