//! In-memory document store
//!
//! This module provides an in-memory [`DocumentStore`], suitable for
//! testing and for short-lived blobs that never need to hit disk.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chunkstream_core::{ChunkDocument, CoreError, DeleteQuery, DocumentStore};
use dashmap::DashMap;
use tracing::{debug, trace};

/// In-memory implementation of DocumentStore
///
/// Uses a `DashMap` of indices for concurrent access; documents inside an
/// index are kept in a `BTreeMap` so listings come back sorted by id.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    indices: DashMap<String, BTreeMap<String, ChunkDocument>>,
}

impl InMemoryDocumentStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in an index
    pub fn document_count(&self, index: &str) -> usize {
        self.indices.get(index).map_or(0, |docs| docs.len())
    }

    /// All document ids in an index, sorted
    pub fn ids(&self, index: &str) -> Vec<String> {
        self.indices
            .get(index)
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Direct access to a stored document, bypassing the async trait
    pub fn document(&self, index: &str, id: &str) -> Option<ChunkDocument> {
        self.indices
            .get(index)
            .and_then(|docs| docs.get(id).cloned())
    }

    /// Insert a document directly, bypassing the async trait
    pub fn insert(&self, index: &str, id: impl Into<String>, document: ChunkDocument) {
        self.indices
            .entry(index.to_string())
            .or_default()
            .insert(id.into(), document);
    }

    /// Remove every index
    pub fn clear(&self) {
        self.indices.clear();
        debug!("Cleared all documents from store");
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, index: &str, id: &str) -> Result<Option<ChunkDocument>, CoreError> {
        trace!(index, id, "Getting document");
        Ok(self.document(index, id))
    }

    async fn index(
        &self,
        index: &str,
        id: &str,
        document: ChunkDocument,
    ) -> Result<(), CoreError> {
        trace!(index, id, bytes = document.data_len(), "Indexing document");
        self.insert(index, id, document);
        Ok(())
    }

    async fn delete_by_query(&self, index: &str, query: &DeleteQuery) -> Result<u64, CoreError> {
        let Some(mut docs) = self.indices.get_mut(index) else {
            return Ok(0);
        };

        let before = docs.len();
        docs.retain(|id, doc| !query.matches(id, doc));
        let deleted = (before - docs.len()) as u64;

        debug!(index, head = query.head_chunk_id(), deleted, "Deleted by query");
        Ok(deleted)
    }
}
