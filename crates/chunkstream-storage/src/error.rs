//! Error types for chunkstream-storage
//!
//! This module defines the errors a content stream session can end with.

use chunkstream_core::CoreError;
use thiserror::Error;

/// Errors that end a content stream session
#[derive(Debug, Error)]
pub enum StreamError {
    /// Two attributes share a name; raised before any backend call
    #[error("Duplicate attributes are not allowed. Found duplicate name \"{name}\".")]
    DuplicateAttribute { name: String },

    /// The backend rejected a get, index or delete-by-query call
    #[error(transparent)]
    Backend(#[from] CoreError),

    /// A stored chunk is not valid base64
    #[error("Failed to decode chunk {id}: {source}")]
    Decode {
        id: String,
        #[source]
        source: base64::DecodeError,
    },

    /// Raw encoding was requested for a payload that is not UTF-8
    #[error("Raw encoding requires UTF-8 content: {0}")]
    InvalidRawPayload(#[from] std::str::Utf8Error),

    /// The stream already finished or failed
    #[error("Content stream is closed")]
    Closed,
}

impl StreamError {
    /// Create a new DuplicateAttribute error
    pub fn duplicate_attribute(name: impl Into<String>) -> Self {
        Self::DuplicateAttribute { name: name.into() }
    }

    /// Whether the error came from the backend
    pub fn is_backend(&self) -> bool {
        matches!(self, StreamError::Backend(_))
    }
}
