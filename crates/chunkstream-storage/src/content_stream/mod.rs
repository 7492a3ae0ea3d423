//! Chunked content streams
//!
//! A [`ContentStream`] moves one logical blob in or out of a
//! [`DocumentStore`]. Writing buffers bytes until [`ContentStream::finish`],
//! then replaces the blob's chunk set: a delete-by-query removes every
//! previous chunk, and the payload is indexed as `0.{id}`, `1.{id}`, ...
//! Reading walks the same ids in order and stops at the first missing or
//! empty chunk, or once the expected size has been delivered.
//!
//! A stream serves one session. Once it has finished or failed it stays
//! closed; create a new one to read or write again.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use chunkstream_storage::{ContentStream, InMemoryDocumentStore};
//! use futures::StreamExt;
//!
//! let store = Arc::new(InMemoryDocumentStore::new());
//!
//! let mut writer = ContentStream::new(store.clone(), None, "files");
//! writer.write(b"hello ")?;
//! writer.write(b"world")?;
//! let summary = writer.finish().await?;
//!
//! let reader = ContentStream::new(store, Some(summary.id), "files").into_reader();
//! let bytes = reader.read_to_end().await?;
//! assert_eq!(&bytes[..], b"hello world");
//! ```

mod params;
mod reader;
mod writer;

use std::fmt::Display;
use std::sync::Arc;

use chunkstream_core::{BlobAttributes, DocumentStore};

pub use params::{ContentStreamParameters, DEFAULT_MAX_CHUNK_SIZE};
pub use reader::ContentReader;
pub use writer::WriteSummary;

/// Lifecycle of a content stream session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    /// Created, nothing read or written yet
    #[default]
    Idle,
    /// Reading chunks or buffering writes
    Active,
    /// Completed; terminal
    Finished,
    /// Failed; terminal
    Errored,
}

impl StreamState {
    /// Whether the state is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamState::Finished | StreamState::Errored)
    }
}

impl Display for StreamState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StreamState::Idle => "idle",
            StreamState::Active => "active",
            StreamState::Finished => "finished",
            StreamState::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// One read or write session over a chunked blob
pub struct ContentStream {
    store: Arc<dyn DocumentStore>,
    id: Option<String>,
    index: String,
    parameters: ContentStreamParameters,
    attributes: BlobAttributes,
    state: StreamState,
    buffer: Vec<u8>,
    bytes_written: u64,
    chunks_written: u32,
}

impl ContentStream {
    /// Create a stream over blob `id` in `index`
    ///
    /// Pass `None` as the id to have one generated when writing.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        id: Option<String>,
        index: impl Into<String>,
    ) -> Self {
        Self {
            store,
            id,
            index: index.into(),
            parameters: ContentStreamParameters::default(),
            attributes: BlobAttributes::new(),
            state: StreamState::Idle,
            buffer: Vec::new(),
            bytes_written: 0,
            chunks_written: 0,
        }
    }

    /// Use the given parameters
    pub fn with_parameters(mut self, parameters: ContentStreamParameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Attributes to store on the head chunk when writing
    pub fn with_attributes(mut self, attributes: BlobAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn parameters(&self) -> &ContentStreamParameters {
        &self.parameters
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// The blob id
    ///
    /// A supplied id is returned at any time. A generated id is returned
    /// only once the write that generated it has persisted something or
    /// completed.
    pub fn content_reference_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Payload bytes persisted so far, before encoding
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Chunk documents persisted so far
    pub fn chunks_written(&self) -> u32 {
        self.chunks_written
    }
}

impl std::fmt::Debug for ContentStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStream")
            .field("id", &self.id)
            .field("index", &self.index)
            .field("parameters", &self.parameters)
            .field("state", &self.state)
            .field("buffered", &self.buffer.len())
            .field("bytes_written", &self.bytes_written)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryDocumentStore;

    #[test]
    fn test_new_stream_is_idle() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let stream = ContentStream::new(store, Some("something".into()), "somewhere");

        assert_eq!(stream.state(), StreamState::Idle);
        assert_eq!(stream.index(), "somewhere");
        assert_eq!(stream.content_reference_id(), Some("something"));
        assert_eq!(stream.bytes_written(), 0);
        assert_eq!(stream.parameters(), &ContentStreamParameters::default());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!StreamState::Idle.is_terminal());
        assert!(!StreamState::Active.is_terminal());
        assert!(StreamState::Finished.is_terminal());
        assert!(StreamState::Errored.is_terminal());
        assert_eq!(StreamState::Errored.to_string(), "errored");
    }
}
