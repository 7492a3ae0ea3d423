//! Chunk identifiers and the stored chunk document

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

/// Identifier of one chunk document: `{sequence}.{baseId}`
///
/// The textual form is the document id in the backend and must stay
/// byte-for-byte stable, since existing chunk sets are addressed by it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkId {
    /// Position of the chunk within its blob, starting at 0
    pub sequence: u32,
    /// Identifier of the logical blob
    pub base_id: String,
}

impl ChunkId {
    /// Create a new chunk ID
    pub fn new(sequence: u32, base_id: impl Into<String>) -> Self {
        Self {
            sequence,
            base_id: base_id.into(),
        }
    }

    /// The head chunk (sequence 0) of a blob
    pub fn head(base_id: impl Into<String>) -> Self {
        Self::new(0, base_id)
    }

    /// Whether this is the head chunk
    pub fn is_head(&self) -> bool {
        self.sequence == 0
    }

    /// The head chunk of the blob this chunk belongs to
    pub fn head_id(&self) -> ChunkId {
        Self::head(self.base_id.clone())
    }

    /// The chunk following this one
    pub fn next(&self) -> ChunkId {
        Self::new(self.sequence + 1, self.base_id.clone())
    }
}

impl Display for ChunkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.sequence, self.base_id)
    }
}

impl FromStr for ChunkId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The base id may itself contain dots; only the first one separates.
        let (sequence, base_id) = s
            .split_once('.')
            .ok_or_else(|| CoreError::InvalidChunkId(s.to_string()))?;

        if base_id.is_empty() || !sequence.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::InvalidChunkId(s.to_string()));
        }

        let sequence = sequence
            .parse()
            .map_err(|_| CoreError::InvalidChunkId(s.to_string()))?;

        Ok(Self::new(sequence, base_id))
    }
}

/// The document stored for one chunk
///
/// Head chunks carry `data` and, when the writer supplied attributes,
/// `app_metadata`. Every other chunk carries `data` and `head_chunk_id`.
/// Absent fields are omitted from the serialized form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkDocument {
    /// Encoded chunk payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    /// Id of chunk 0, present on every non-head chunk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_chunk_id: Option<String>,

    /// Caller metadata, present on the head chunk only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_metadata: Option<Map<String, Value>>,
}

impl ChunkDocument {
    /// Build the head chunk document
    pub fn head(data: impl Into<String>, app_metadata: Option<Map<String, Value>>) -> Self {
        Self {
            data: Some(data.into()),
            head_chunk_id: None,
            app_metadata,
        }
    }

    /// Build a non-head chunk document pointing at `head`
    pub fn continuation(data: impl Into<String>, head: &ChunkId) -> Self {
        Self {
            data: Some(data.into()),
            head_chunk_id: Some(head.to_string()),
            app_metadata: None,
        }
    }

    /// Whether this document is a head chunk
    pub fn is_head(&self) -> bool {
        self.head_chunk_id.is_none()
    }

    /// Length of the encoded payload, 0 when absent
    pub fn data_len(&self) -> usize {
        self.data.as_ref().map_or(0, String::len)
    }
}
