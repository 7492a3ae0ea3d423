//! Error types for chunkstream-core
//!
//! Backends report every failure through [`CoreError`]. A missing document
//! is not an error: [`crate::DocumentStore::get`] returns `Ok(None)`.

use thiserror::Error;

/// Errors raised by document backends and core type parsing
#[derive(Debug, Error)]
pub enum CoreError {
    /// I/O error inside a backend
    #[error("Storage I/O error: {0}")]
    Io(String),

    /// A document could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A stored document could not be deserialized
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// A byte size string could not be parsed
    #[error("Invalid byte size: {0}")]
    InvalidByteSize(String),

    /// A chunk id did not have the `{sequence}.{baseId}` shape
    #[error("Invalid chunk id: {0}")]
    InvalidChunkId(String),

    /// An index or document name is not usable by the backend
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// The backend rejected the request
    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::Io(err.to_string())
    }
}

impl CoreError {
    /// Create a new Backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Create a new Serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Create a new Deserialization error
    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::Deserialization(message.into())
    }

    /// Create a new InvalidName error
    pub fn invalid_name(name: impl Into<String>) -> Self {
        Self::InvalidName(name.into())
    }
}

/// Result type alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;
