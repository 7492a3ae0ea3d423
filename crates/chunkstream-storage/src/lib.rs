//! # Chunkstream Storage
//!
//! Chunked content streams over document stores.
//!
//! A blob is written as a sequence of fixed-size chunk documents and read
//! back lazily, one chunk at a time. See [`content_stream`] for the
//! protocol.
//!
//! ## Features
//!
//! - **ContentStream**: Writes a blob as chunk documents, or reads one back as a `Stream` of bytes
//! - **InMemoryDocumentStore**: In-memory backend for testing and short-lived data
//! - **FileDocumentStore**: One JSON file per document, written atomically
//! - **MockDocumentStore**: Records calls and injects failures, for tests
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use chunkstream_core::{BlobAttributes, ContentEncoding};
//! use chunkstream_storage::{ContentStream, ContentStreamParameters, InMemoryDocumentStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(InMemoryDocumentStore::new());
//!     let params = ContentStreamParameters::default().with_encoding(ContentEncoding::Base64);
//!
//!     let mut writer = ContentStream::new(store.clone(), Some("report".into()), "files")
//!         .with_parameters(params)
//!         .with_attributes(BlobAttributes::new().with("mime", "application/pdf"));
//!     writer.end(b"%PDF-1.7 ...").await.unwrap();
//!
//!     let bytes = ContentStream::new(store, Some("report".into()), "files")
//!         .with_parameters(params)
//!         .read_to_end()
//!         .await
//!         .unwrap();
//!     assert_eq!(&bytes[..], b"%PDF-1.7 ...");
//! }
//! ```

pub mod content_stream;
pub mod error;
pub mod memory;
pub mod mock;
pub mod persistent;

// Re-exports
pub use content_stream::{
    ContentReader, ContentStream, ContentStreamParameters, DEFAULT_MAX_CHUNK_SIZE, StreamState,
    WriteSummary,
};
pub use error::StreamError;
pub use memory::InMemoryDocumentStore;
pub use mock::{MockDocumentStore, StoreCall};
pub use persistent::{FileDocumentStore, FileStoreConfig};

// Re-export the backend trait for convenience
pub use chunkstream_core::DocumentStore;
