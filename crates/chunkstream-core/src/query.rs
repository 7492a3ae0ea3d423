//! Delete query selecting every chunk of one blob

use serde_json::{Value, json};

use crate::chunk::{ChunkDocument, ChunkId};

/// Matches the head chunk of a blob and every chunk pointing at it
///
/// On the wire this is a boolean `should` query with two `match` clauses:
/// `head_chunk_id == "0.{baseId}"` or `_id == "0.{baseId}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeleteQuery {
    head_chunk_id: String,
}

impl DeleteQuery {
    /// Query for all chunks anchored at `head`
    pub fn for_head(head: &ChunkId) -> Self {
        Self {
            head_chunk_id: head.head_id().to_string(),
        }
    }

    /// Query for all chunks of the blob `base_id`
    pub fn for_blob(base_id: impl Into<String>) -> Self {
        Self::for_head(&ChunkId::head(base_id))
    }

    /// The head chunk id both clauses match against
    pub fn head_chunk_id(&self) -> &str {
        &self.head_chunk_id
    }

    /// Evaluate the query against a stored document
    pub fn matches(&self, id: &str, document: &ChunkDocument) -> bool {
        id == self.head_chunk_id
            || document.head_chunk_id.as_deref() == Some(self.head_chunk_id.as_str())
    }

    /// Whether `id` alone names a chunk of this blob
    ///
    /// True for the head id and for any `{seq}.{baseId}` with the same
    /// base id. Backends use this to match documents they cannot read.
    pub fn covers_id(&self, id: &str) -> bool {
        match id.parse::<ChunkId>() {
            Ok(chunk_id) => chunk_id.head_id().to_string() == self.head_chunk_id,
            Err(_) => false,
        }
    }

    /// The query body in search-engine query DSL
    pub fn to_json(&self) -> Value {
        json!({
            "bool": {
                "should": [
                    { "match": { "head_chunk_id": self.head_chunk_id } },
                    { "match": { "_id": self.head_chunk_id } },
                ]
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_shape() {
        let query = DeleteQuery::for_blob("something");
        let json = query.to_json();

        assert_eq!(
            json["bool"]["should"][0]["match"]["head_chunk_id"],
            "0.something"
        );
        assert_eq!(json["bool"]["should"][1]["match"]["_id"], "0.something");
    }

    #[test]
    fn test_for_head_normalizes_to_chunk_zero() {
        let query = DeleteQuery::for_head(&ChunkId::new(4, "x"));
        assert_eq!(query.head_chunk_id(), "0.x");
    }

    #[test]
    fn test_matches() {
        let query = DeleteQuery::for_blob("x");
        let head = ChunkId::head("x");

        assert!(query.matches("0.x", &ChunkDocument::head("12", None)));
        assert!(query.matches("1.x", &ChunkDocument::continuation("34", &head)));
        assert!(!query.matches("0.y", &ChunkDocument::head("12", None)));
        assert!(!query.matches(
            "1.y",
            &ChunkDocument::continuation("34", &ChunkId::head("y"))
        ));
    }

    #[test]
    fn test_covers_id() {
        let query = DeleteQuery::for_blob("x");

        assert!(query.covers_id("0.x"));
        assert!(query.covers_id("2.x"));
        assert!(!query.covers_id("2.y"));
        assert!(!query.covers_id("2.x.y"));
        assert!(!query.covers_id("x"));
    }
}
