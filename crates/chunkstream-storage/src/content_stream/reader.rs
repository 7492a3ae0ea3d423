//! Read side of a content stream

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_stream::try_stream;
use bytes::{Bytes, BytesMut};
use chunkstream_core::{ChunkId, DocumentStore};
use futures::stream::{BoxStream, FusedStream, Stream, StreamExt};
use tracing::{debug, trace};

use super::{ContentStream, ContentStreamParameters, StreamState};
use crate::error::StreamError;

/// Lazy, forward-only sequence of decoded chunk payloads
///
/// Each poll that needs a new chunk issues one `get` for the next chunk
/// id. The reader ends at the first missing or empty chunk, or once the
/// expected size has been delivered. A backend or decode failure is
/// yielded once and ends the reader. Dropping the reader releases its
/// handle on the store.
pub struct ContentReader {
    inner: BoxStream<'static, Result<Bytes, StreamError>>,
    state: StreamState,
    bytes_read: u64,
    chunks_read: u32,
}

impl ContentReader {
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Decoded bytes delivered so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Chunks delivered so far
    pub fn chunks_read(&self) -> u32 {
        self.chunks_read
    }

    /// Drain the reader into one buffer
    pub async fn read_to_end(mut self) -> Result<Bytes, StreamError> {
        let mut out = BytesMut::new();
        while let Some(chunk) = self.next().await {
            out.extend_from_slice(&chunk?);
        }
        Ok(out.freeze())
    }
}

impl Stream for ContentReader {
    type Item = Result<Bytes, StreamError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.state.is_terminal() {
            return Poll::Ready(None);
        }

        match this.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.state = StreamState::Active;
                this.bytes_read += chunk.len() as u64;
                this.chunks_read += 1;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                this.state = StreamState::Errored;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.state = StreamState::Finished;
                Poll::Ready(None)
            }
            Poll::Pending => {
                this.state = StreamState::Active;
                Poll::Pending
            }
        }
    }
}

impl FusedStream for ContentReader {
    fn is_terminated(&self) -> bool {
        self.state.is_terminal()
    }
}

impl std::fmt::Debug for ContentReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentReader")
            .field("state", &self.state)
            .field("bytes_read", &self.bytes_read)
            .field("chunks_read", &self.chunks_read)
            .finish()
    }
}

impl ContentStream {
    /// Turn this stream into a reader over its blob
    ///
    /// Without an id there is nothing to read and the reader is empty.
    pub fn into_reader(self) -> ContentReader {
        let inner = match self.id {
            Some(base_id) => {
                read_chunks(self.store, base_id, self.index, self.parameters).boxed()
            }
            None => {
                debug!(index = %self.index, "No content id, nothing to read");
                futures::stream::empty().boxed()
            }
        };

        ContentReader {
            inner,
            state: StreamState::Idle,
            bytes_read: 0,
            chunks_read: 0,
        }
    }

    /// Read the whole blob into one buffer
    pub async fn read_to_end(self) -> Result<Bytes, StreamError> {
        self.into_reader().read_to_end().await
    }
}

fn read_chunks(
    store: Arc<dyn DocumentStore>,
    base_id: String,
    index: String,
    parameters: ContentStreamParameters,
) -> impl Stream<Item = Result<Bytes, StreamError>> + Send + 'static {
    try_stream! {
        let mut chunk_id = ChunkId::head(base_id);
        let mut bytes_read: u64 = 0;

        loop {
            let id = chunk_id.to_string();
            let document = store.get(&index, &id).await?;

            let data = match document.and_then(|document| document.data) {
                Some(data) => data,
                None => {
                    trace!(index = %index, chunk = %id, "No chunk, end of content");
                    break;
                }
            };

            let decoded = parameters
                .encoding
                .decode(&data)
                .map_err(|source| StreamError::Decode { id: id.clone(), source })?;

            if decoded.is_empty() {
                trace!(index = %index, chunk = %id, "Empty chunk, end of content");
                break;
            }

            bytes_read += decoded.len() as u64;
            trace!(index = %index, chunk = %id, bytes = decoded.len(), "Chunk read");
            yield Bytes::from(decoded);

            if parameters.is_read(bytes_read) {
                break;
            }
            chunk_id = chunk_id.next();
        }

        debug!(
            index = %index,
            id = %chunk_id.base_id,
            bytes = bytes_read,
            "Content stream read"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockDocumentStore;
    use chunkstream_core::{ChunkDocument, ContentEncoding};

    fn raw(size: Option<u64>) -> ContentStreamParameters {
        ContentStreamParameters {
            encoding: ContentEncoding::Raw,
            size,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_reader_tracks_progress() {
        let store = Arc::new(MockDocumentStore::new());
        store.seed("somewhere", "0.something", ChunkDocument::head("12", None));
        store.seed("somewhere", "1.something", ChunkDocument::head("34", None));

        let mut reader = ContentStream::new(store.clone(), Some("something".into()), "somewhere")
            .with_parameters(raw(None))
            .into_reader();
        assert_eq!(reader.state(), StreamState::Idle);

        let first = reader.next().await.unwrap().unwrap();
        assert_eq!(&first[..], b"12");
        assert_eq!(reader.bytes_read(), 2);

        assert!(reader.next().await.unwrap().is_ok());
        assert!(reader.next().await.is_none());
        assert_eq!(reader.state(), StreamState::Finished);
        assert_eq!(reader.chunks_read(), 2);
        assert!(reader.is_terminated());

        // Terminal readers stay quiet
        assert!(reader.next().await.is_none());
        assert_eq!(store.get_calls().len(), 3);
    }

    #[test]
    fn test_reader_is_lazy() {
        let store = Arc::new(MockDocumentStore::new());
        store.seed("somewhere", "0.something", ChunkDocument::head("12", None));

        let mut reader = ContentStream::new(store.clone(), Some("something".into()), "somewhere")
            .with_parameters(raw(Some(2)))
            .into_reader();
        assert!(store.calls().is_empty());

        let chunk = tokio_test::block_on(reader.next()).unwrap().unwrap();
        assert_eq!(&chunk[..], b"12");
        assert_eq!(store.get_calls(), vec!["0.something"]);
    }

    #[tokio::test]
    async fn test_reader_without_id_is_empty() {
        let store = Arc::new(MockDocumentStore::new());
        let reader = ContentStream::new(store.clone(), None, "somewhere").into_reader();

        let bytes = reader.read_to_end().await.unwrap();
        assert!(bytes.is_empty());
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_reader_decode_error() {
        let store = Arc::new(MockDocumentStore::new());
        store.seed("somewhere", "0.something", ChunkDocument::head("%%%", None));

        let mut reader = ContentStream::new(store, Some("something".into()), "somewhere")
            .into_reader();

        let err = reader.next().await.unwrap().unwrap_err();
        assert!(matches!(err, StreamError::Decode { ref id, .. } if id == "0.something"));
        assert_eq!(reader.state(), StreamState::Errored);
        assert!(reader.next().await.is_none());
    }

    #[tokio::test]
    async fn test_dropping_reader_releases_store() {
        let store = Arc::new(MockDocumentStore::new());
        store.seed("somewhere", "0.something", ChunkDocument::head("12", None));

        let mut reader = ContentStream::new(store.clone(), Some("something".into()), "somewhere")
            .with_parameters(raw(None))
            .into_reader();
        reader.next().await.unwrap().unwrap();
        assert_eq!(Arc::strong_count(&store), 2);

        drop(reader);
        assert_eq!(Arc::strong_count(&store), 1);
    }
}
