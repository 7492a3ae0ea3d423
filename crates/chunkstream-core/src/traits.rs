//! Core traits for chunkstream
//!
//! These traits let the same content stream logic run against an
//! in-memory map in tests and a real document backend elsewhere.

use async_trait::async_trait;

use crate::chunk::ChunkDocument;
use crate::error::CoreError;
use crate::query::DeleteQuery;

/// Document-oriented storage backend
///
/// The three operations are the whole surface the content stream needs.
/// Implementations must be safe to share across tasks.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point lookup of one document
    ///
    /// Returns `Ok(None)` when the document (or the whole index) does not
    /// exist. Only backend failures are errors.
    async fn get(&self, index: &str, id: &str) -> Result<Option<ChunkDocument>, CoreError>;

    /// Create or overwrite one document
    async fn index(&self, index: &str, id: &str, document: ChunkDocument)
    -> Result<(), CoreError>;

    /// Delete every document matching `query`
    ///
    /// Returns the number of deleted documents. A missing index deletes
    /// nothing and is not an error.
    async fn delete_by_query(&self, index: &str, query: &DeleteQuery) -> Result<u64, CoreError>;
}
