//! Well-known internal IRIs.
//!
//! The language-filter rewrite needs two pieces of vocabulary: the
//! predicate that links a literal to its language tag, and the entity
//! URI that represents a language within the store. The URI conversion
//! lives with the store's entity-URI helpers; this module is the thin
//! in-crate face of that boundary.

use std::sync::Arc;

/// Predicate linking a literal to its language entity.
///
/// Used for the synthetic triple appended when a language filter cannot
/// be pushed into an existing predicate.
pub const LANGUAGE_PREDICATE: &str = "urn:tern:builtin:langtag";

/// Convert a language tag (e.g. `en`) to the entity URI that represents
/// the language in the store.
pub fn convert_langtag_to_entity_uri(langtag: &str) -> Arc<str> {
    Arc::from(format!("urn:tern:language:{langtag}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_langtag_entity_uri() {
        assert_eq!(
            convert_langtag_to_entity_uri("en").as_ref(),
            "urn:tern:language:en"
        );
    }
}
