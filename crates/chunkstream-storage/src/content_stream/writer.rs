//! Write side of a content stream

use chunkstream_core::{ChunkDocument, ChunkId, ContentEncoding, DeleteQuery};
use tracing::{debug, error, instrument, trace};
use uuid::Uuid;

use super::{ContentStream, StreamState};
use crate::error::StreamError;

/// Outcome of a completed write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    /// Blob id, generated if none was supplied
    pub id: String,
    /// Payload bytes persisted, before encoding
    pub bytes_written: u64,
    /// Chunk documents persisted
    pub chunks_written: u32,
}

/// One chunk ready to be indexed
struct EncodedChunk {
    /// Payload length before encoding
    len: usize,
    /// Value of the `data` field
    data: String,
}

impl ContentStream {
    /// Buffer bytes for the next [`finish`](Self::finish)
    ///
    /// Nothing reaches the backend until the stream is finished.
    pub fn write(&mut self, data: impl AsRef<[u8]>) -> Result<(), StreamError> {
        if self.state.is_terminal() {
            return Err(StreamError::Closed);
        }
        self.state = StreamState::Active;
        self.buffer.extend_from_slice(data.as_ref());
        Ok(())
    }

    /// Write `data` and finish in one call
    pub async fn end(&mut self, data: impl AsRef<[u8]>) -> Result<WriteSummary, StreamError> {
        self.write(data)?;
        self.finish().await
    }

    /// Persist the buffered payload as a fresh chunk set
    ///
    /// Attribute names are validated and the payload is split before any
    /// backend call. Then every previous chunk of the blob is deleted and
    /// the new chunks are indexed one at a time, head chunk first. A
    /// failure leaves already indexed chunks in place.
    #[instrument(skip(self), fields(index = %self.index, buffered = self.buffer.len()))]
    pub async fn finish(&mut self) -> Result<WriteSummary, StreamError> {
        if self.state.is_terminal() {
            return Err(StreamError::Closed);
        }
        self.state = StreamState::Active;

        match self.flush().await {
            Ok(summary) => {
                self.state = StreamState::Finished;
                debug!(
                    id = %summary.id,
                    bytes = summary.bytes_written,
                    chunks = summary.chunks_written,
                    "Content stream written"
                );
                Ok(summary)
            }
            Err(e) => {
                self.state = StreamState::Errored;
                error!(error = %e, "Content stream write failed");
                Err(e)
            }
        }
    }

    async fn flush(&mut self) -> Result<WriteSummary, StreamError> {
        if let Some(name) = self.attributes.find_duplicate() {
            return Err(StreamError::duplicate_attribute(name));
        }

        let payload = std::mem::take(&mut self.buffer);
        let chunks = self.encode_chunks(&payload)?;

        let base_id = self
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let head = ChunkId::head(base_id.as_str());

        self.remove_chunks(&head).await?;

        let mut chunk_id = head.clone();
        for chunk in chunks {
            let document = if chunk_id.is_head() {
                ChunkDocument::head(chunk.data, self.attributes.to_metadata())
            } else {
                ChunkDocument::continuation(chunk.data, &head)
            };

            self.store
                .index(&self.index, &chunk_id.to_string(), document)
                .await?;

            self.id.get_or_insert_with(|| base_id.clone());
            self.chunks_written += 1;
            self.bytes_written += chunk.len as u64;
            trace!(chunk = %chunk_id, bytes = chunk.len, "Chunk written");

            chunk_id = chunk_id.next();
        }

        self.id.get_or_insert_with(|| base_id.clone());

        Ok(WriteSummary {
            id: base_id,
            bytes_written: self.bytes_written,
            chunks_written: self.chunks_written,
        })
    }

    async fn remove_chunks(&self, head: &ChunkId) -> Result<(), StreamError> {
        let query = DeleteQuery::for_head(head);
        let deleted = self.store.delete_by_query(&self.index, &query).await?;
        if deleted > 0 {
            debug!(head = %head, deleted, "Removed previous chunks");
        }
        Ok(())
    }

    fn encode_chunks(&self, payload: &[u8]) -> Result<Vec<EncodedChunk>, StreamError> {
        let segment_len = self.parameters.segment_len();

        match self.parameters.encoding {
            ContentEncoding::Base64 => Ok(payload
                .chunks(segment_len)
                .map(|segment| EncodedChunk {
                    len: segment.len(),
                    data: ContentEncoding::encode_base64(segment),
                })
                .collect()),
            ContentEncoding::Raw => {
                let text = std::str::from_utf8(payload)?;
                Ok(split_utf8(text, segment_len)
                    .into_iter()
                    .map(|segment| EncodedChunk {
                        len: segment.len(),
                        data: segment.to_string(),
                    })
                    .collect())
            }
        }
    }
}

/// Split text into pieces of at most `max` bytes without cutting a character
///
/// A character wider than `max` becomes a piece of its own.
fn split_utf8(text: &str, max: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let mut end = max.min(rest.len());
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        if end == 0 {
            end = rest.chars().next().map_or(rest.len(), char::len_utf8);
        }

        let (piece, tail) = rest.split_at(end);
        pieces.push(piece);
        rest = tail;
    }

    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::content_stream::ContentStreamParameters;
    use crate::mock::MockDocumentStore;
    use chunkstream_core::{BlobAttributes, ByteSize};

    fn small_chunks(encoding: ContentEncoding) -> ContentStreamParameters {
        ContentStreamParameters::default()
            .with_encoding(encoding)
            .with_max_chunk_size(ByteSize::from_bytes(1028))
    }

    #[test]
    fn test_split_utf8_ascii() {
        assert_eq!(split_utf8("123456", 2), vec!["12", "34", "56"]);
        assert_eq!(split_utf8("12345", 2), vec!["12", "34", "5"]);
        assert!(split_utf8("", 2).is_empty());
    }

    #[test]
    fn test_split_utf8_keeps_characters_whole() {
        // "é" is two bytes, "€" is three
        assert_eq!(split_utf8("aé€b", 2), vec!["a", "é", "€", "b"]);
        assert_eq!(split_utf8("aé€b", 4), vec!["aé", "€b"]);
        assert_eq!(split_utf8("€€", 1), vec!["€", "€"]);
    }

    #[tokio::test]
    async fn test_write_does_not_touch_backend() {
        let store = Arc::new(MockDocumentStore::new());
        let mut stream = ContentStream::new(store.clone(), Some("something".into()), "somewhere");

        stream.write("something").unwrap();

        assert!(store.calls().is_empty());
        assert_eq!(stream.state(), StreamState::Active);
    }

    #[tokio::test]
    async fn test_generated_id_only_after_write() {
        let store = Arc::new(MockDocumentStore::new());
        let mut stream = ContentStream::new(store.clone(), None, "somewhere");
        assert_eq!(stream.content_reference_id(), None);

        let summary = stream.end("some data").await.unwrap();

        let id = stream.content_reference_id().unwrap();
        assert_eq!(id, summary.id);
        assert!(Uuid::parse_str(id).is_ok());
        assert_eq!(store.index_calls()[0].0, format!("0.{id}"));
    }

    #[tokio::test]
    async fn test_duplicate_attributes_fail_before_io() {
        let store = Arc::new(MockDocumentStore::new());
        let attributes: BlobAttributes = [("myName", "myValue"), ("myName", "myOtherValue")]
            .into_iter()
            .collect();
        let mut stream = ContentStream::new(store.clone(), Some("something".into()), "somewhere")
            .with_parameters(small_chunks(ContentEncoding::Base64))
            .with_attributes(attributes);

        let err = stream.end("12345678").await.unwrap_err();

        assert!(matches!(err, StreamError::DuplicateAttribute { ref name } if name == "myName"));
        assert!(store.calls().is_empty());
        assert_eq!(stream.state(), StreamState::Errored);
    }

    #[tokio::test]
    async fn test_raw_requires_utf8_before_io() {
        let store = Arc::new(MockDocumentStore::new());
        let mut stream = ContentStream::new(store.clone(), Some("something".into()), "somewhere")
            .with_parameters(small_chunks(ContentEncoding::Raw));

        let err = stream.end(b"\xff\xfe").await.unwrap_err();

        assert!(matches!(err, StreamError::InvalidRawPayload(_)));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_raw_wide_character_exceeds_tiny_segment() {
        let store = Arc::new(MockDocumentStore::new());
        let parameters = ContentStreamParameters::default()
            .with_encoding(ContentEncoding::Raw)
            .with_max_chunk_size(ByteSize::from_bytes(1025));
        assert_eq!(parameters.segment_len(), 1);

        let mut stream = ContentStream::new(store.clone(), Some("something".into()), "somewhere")
            .with_parameters(parameters);
        let summary = stream.end("a€").await.unwrap();

        let data: Vec<_> = store
            .index_calls()
            .into_iter()
            .map(|(_, document)| document.data.unwrap_or_default())
            .collect();
        assert_eq!(data, vec!["a", "€"]);
        assert_eq!(summary.bytes_written, 4);
    }

    #[tokio::test]
    async fn test_closed_after_finish() {
        let store = Arc::new(MockDocumentStore::new());
        let mut stream = ContentStream::new(store, Some("something".into()), "somewhere");

        stream.end("data").await.unwrap();
        assert_eq!(stream.state(), StreamState::Finished);

        assert!(matches!(stream.write("more"), Err(StreamError::Closed)));
        assert!(matches!(stream.finish().await, Err(StreamError::Closed)));
    }
}
