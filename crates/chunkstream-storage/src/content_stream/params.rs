//! Content stream parameters

use chunkstream_core::{ByteSize, ContentEncoding};
use serde::{Deserialize, Serialize};

/// Default request size limit per chunk document
pub const DEFAULT_MAX_CHUNK_SIZE: ByteSize = ByteSize::mb(4);

/// Parameters shared by the read and write side of a content stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContentStreamParameters {
    /// How chunk payloads are stored
    pub encoding: ContentEncoding,
    /// Expected total size in bytes; reading stops once it is reached
    pub size: Option<u64>,
    /// Request size limit per chunk, including request overhead
    pub max_chunk_size: ByteSize,
}

impl Default for ContentStreamParameters {
    fn default() -> Self {
        Self {
            encoding: ContentEncoding::default(),
            size: None,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
        }
    }
}

impl ContentStreamParameters {
    /// Set the encoding
    pub fn with_encoding(mut self, encoding: ContentEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the expected total size
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Set the per-chunk request size limit
    pub fn with_max_chunk_size(mut self, max_chunk_size: ByteSize) -> Self {
        self.max_chunk_size = max_chunk_size;
        self
    }

    /// Payload bytes per chunk under the configured limit and encoding
    pub fn segment_len(&self) -> usize {
        self.encoding.max_segment_len(self.max_chunk_size)
    }

    /// Whether `bytes_read` satisfies the expected size
    ///
    /// A size of 0 counts as unknown.
    pub fn is_read(&self, bytes_read: u64) -> bool {
        matches!(self.size, Some(size) if size > 0 && bytes_read >= size)
    }
}
