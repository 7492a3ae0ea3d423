//! # Chunkstream Core
//!
//! Core traits, types, and errors shared by the chunkstream crates.
//!
//! A logical blob is stored as a run of chunk documents in a document
//! store. Chunk `n` of blob `x` lives at id `n.x`; chunk 0 is the head
//! chunk and carries the caller's metadata, every later chunk points back
//! at it through `head_chunk_id`.
//!
//! ## Key Traits
//!
//! - [`DocumentStore`]: Abstraction over the document backend (get, index, delete-by-query)
//!
//! ## Key Types
//!
//! - [`ChunkId`]: Composite `{sequence}.{baseId}` document identifier
//! - [`ChunkDocument`]: The stored shape of one chunk
//! - [`DeleteQuery`]: Query selecting every chunk of one blob
//! - [`ContentEncoding`]: How chunk payloads are stored (`raw` or `base64`)
//! - [`ByteSize`]: Human-readable byte sizes such as `4mb` or `1028B`
//! - [`BlobAttributes`]: Ordered caller metadata stored on the head chunk

pub mod attributes;
pub mod byte_size;
pub mod chunk;
pub mod encoding;
pub mod error;
pub mod query;
pub mod traits;

// Re-export main types
pub use attributes::*;
pub use byte_size::*;
pub use chunk::*;
pub use encoding::*;
pub use error::*;
pub use query::*;
pub use traits::*;
