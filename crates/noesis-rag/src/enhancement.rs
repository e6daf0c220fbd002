//! Query enhancement with state context.

use noesis_core::models::StateSnapshot;

/// Append a short description of the current state to the query text.
pub fn enhance_query(query: &str, snapshot: &StateSnapshot) -> String {
    let query = query.trim();
    let context = snapshot.describe();
    if query.is_empty() {
        context
    } else {
        format!("{query} ({context})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_state_description() {
        let snapshot = StateSnapshot::new(1, 0.8).with_population("focus", 0.9);
        let enhanced = enhance_query("  breathing  ", &snapshot);
        assert!(enhanced.starts_with("breathing ("));
        assert!(enhanced.contains("focus"));
    }
}
