//! Recording document store for tests
//!
//! [`MockDocumentStore`] wraps an [`InMemoryDocumentStore`], records every
//! call made through the [`DocumentStore`] trait, and can be told to fail
//! the next call of a given kind. Tests use it to assert call order and to
//! exercise backend failure paths.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chunkstream_core::{ChunkDocument, CoreError, DeleteQuery, DocumentStore};

use crate::memory::InMemoryDocumentStore;

/// One call observed by the mock
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Get {
        index: String,
        id: String,
    },
    Index {
        index: String,
        id: String,
        document: ChunkDocument,
    },
    DeleteByQuery {
        index: String,
        query: DeleteQuery,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallKind {
    Get,
    Index,
    DeleteByQuery,
}

/// In-memory store that records calls and injects failures
#[derive(Debug, Default)]
pub struct MockDocumentStore {
    inner: InMemoryDocumentStore,
    calls: Mutex<Vec<StoreCall>>,
    failures: Mutex<VecDeque<Failure>>,
}

#[derive(Debug)]
struct Failure {
    kind: CallKind,
    /// Matching calls to let through before failing
    skip: usize,
    message: String,
}

impl MockDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The backing in-memory store
    pub fn inner(&self) -> &InMemoryDocumentStore {
        &self.inner
    }

    /// Seed a document without recording a call
    pub fn seed(&self, index: &str, id: impl Into<String>, document: ChunkDocument) {
        self.inner.insert(index, id, document);
    }

    /// Every call so far, in order
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock_calls().clone()
    }

    /// Ids passed to `get`, in order
    pub fn get_calls(&self) -> Vec<String> {
        self.lock_calls()
            .iter()
            .filter_map(|call| match call {
                StoreCall::Get { id, .. } => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    /// `(id, document)` pairs passed to `index`, in order
    pub fn index_calls(&self) -> Vec<(String, ChunkDocument)> {
        self.lock_calls()
            .iter()
            .filter_map(|call| match call {
                StoreCall::Index { id, document, .. } => Some((id.clone(), document.clone())),
                _ => None,
            })
            .collect()
    }

    /// Queries passed to `delete_by_query`, in order
    pub fn delete_calls(&self) -> Vec<DeleteQuery> {
        self.lock_calls()
            .iter()
            .filter_map(|call| match call {
                StoreCall::DeleteByQuery { query, .. } => Some(query.clone()),
                _ => None,
            })
            .collect()
    }

    /// Fail the next `get` with a backend error
    pub fn fail_next_get(&self, message: impl Into<String>) {
        self.push_failure(CallKind::Get, 0, message.into());
    }

    /// Fail the next `index` with a backend error
    pub fn fail_next_index(&self, message: impl Into<String>) {
        self.push_failure(CallKind::Index, 0, message.into());
    }

    /// Let `skip` index calls succeed, then fail the next one
    pub fn fail_index_after(&self, skip: usize, message: impl Into<String>) {
        self.push_failure(CallKind::Index, skip, message.into());
    }

    /// Fail the next `delete_by_query` with a backend error
    pub fn fail_next_delete(&self, message: impl Into<String>) {
        self.push_failure(CallKind::DeleteByQuery, 0, message.into());
    }

    fn push_failure(&self, kind: CallKind, skip: usize, message: String) {
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(Failure {
                kind,
                skip,
                message,
            });
    }

    fn take_failure(&self, kind: CallKind) -> Option<CoreError> {
        let mut failures = self
            .failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let position = failures.iter().position(|f| f.kind == kind)?;

        if failures[position].skip > 0 {
            failures[position].skip -= 1;
            return None;
        }

        failures
            .remove(position)
            .map(|failure| CoreError::backend(failure.message))
    }

    fn record(&self, call: StoreCall) {
        self.lock_calls().push(call);
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<StoreCall>> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl DocumentStore for MockDocumentStore {
    async fn get(&self, index: &str, id: &str) -> Result<Option<ChunkDocument>, CoreError> {
        self.record(StoreCall::Get {
            index: index.to_string(),
            id: id.to_string(),
        });
        if let Some(err) = self.take_failure(CallKind::Get) {
            return Err(err);
        }
        self.inner.get(index, id).await
    }

    async fn index(
        &self,
        index: &str,
        id: &str,
        document: ChunkDocument,
    ) -> Result<(), CoreError> {
        self.record(StoreCall::Index {
            index: index.to_string(),
            id: id.to_string(),
            document: document.clone(),
        });
        if let Some(err) = self.take_failure(CallKind::Index) {
            return Err(err);
        }
        self.inner.index(index, id, document).await
    }

    async fn delete_by_query(&self, index: &str, query: &DeleteQuery) -> Result<u64, CoreError> {
        self.record(StoreCall::DeleteByQuery {
            index: index.to_string(),
            query: query.clone(),
        });
        if let Some(err) = self.take_failure(CallKind::DeleteByQuery) {
            return Err(err);
        }
        self.inner.delete_by_query(index, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_calls_in_order() {
        let store = MockDocumentStore::new();
        store
            .delete_by_query("somewhere", &DeleteQuery::for_blob("x"))
            .await
            .unwrap();
        store
            .index("somewhere", "0.x", ChunkDocument::head("12", None))
            .await
            .unwrap();
        store.get("somewhere", "0.x").await.unwrap();

        let calls = store.calls();
        assert_eq!(calls.len(), 3);
        assert!(matches!(calls[0], StoreCall::DeleteByQuery { .. }));
        assert!(matches!(calls[1], StoreCall::Index { .. }));
        assert!(matches!(calls[2], StoreCall::Get { .. }));
        assert_eq!(store.get_calls(), vec!["0.x"]);
    }

    #[tokio::test]
    async fn test_injected_failure_fires_once() {
        let store = MockDocumentStore::new();
        store.fail_next_get("some error");

        let err = store.get("somewhere", "0.x").await.unwrap_err();
        assert_eq!(err.to_string(), "Backend error: some error");

        assert!(store.get("somewhere", "0.x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failure_only_hits_matching_kind() {
        let store = MockDocumentStore::new();
        store.fail_next_index("index down");

        store.get("somewhere", "0.x").await.unwrap();
        assert!(
            store
                .index("somewhere", "0.x", ChunkDocument::head("12", None))
                .await
                .is_err()
        );
        assert_eq!(store.inner().document_count("somewhere"), 0);
    }

    #[tokio::test]
    async fn test_fail_index_after_skips() {
        let store = MockDocumentStore::new();
        store.fail_index_after(2, "third call fails");

        for id in ["0.x", "1.x"] {
            store
                .index("somewhere", id, ChunkDocument::head("12", None))
                .await
                .unwrap();
        }
        assert!(
            store
                .index("somewhere", "2.x", ChunkDocument::head("56", None))
                .await
                .is_err()
        );
        assert_eq!(store.inner().document_count("somewhere"), 2);
    }
}
