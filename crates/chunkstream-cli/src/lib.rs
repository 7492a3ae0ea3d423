//! Command line access to chunked content streams
//!
//! Blobs are kept in a [`FileDocumentStore`](chunkstream_storage::FileDocumentStore)
//! rooted at `--store`.

pub mod commands;
pub mod config;

pub use commands::ChunkInfo;
pub use config::{Cli, Command};
