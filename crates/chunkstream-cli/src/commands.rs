//! Command implementations, independent of argument parsing

use std::sync::Arc;

use anyhow::Context;
use chunkstream_core::{BlobAttributes, ChunkId, DeleteQuery, DocumentStore};
use chunkstream_storage::{ContentStream, ContentStreamParameters, WriteSummary};
use futures::StreamExt;
use serde_json::{Map, Value};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::info;

/// One stored chunk as seen by `inspect`
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkInfo {
    pub id: String,
    /// Length of the stored `data` field
    pub data_len: usize,
    pub app_metadata: Option<Map<String, Value>>,
}

/// Write `data` as the blob `id`, generating an id when none is given
pub async fn put(
    store: Arc<dyn DocumentStore>,
    id: Option<String>,
    index: &str,
    parameters: ContentStreamParameters,
    attributes: BlobAttributes,
    data: &[u8],
) -> anyhow::Result<WriteSummary> {
    let mut stream = ContentStream::new(store, id, index)
        .with_parameters(parameters)
        .with_attributes(attributes);

    let summary = stream.end(data).await.context("Failed to write blob")?;
    info!(id = %summary.id, chunks = summary.chunks_written, "Blob stored");
    Ok(summary)
}

/// Copy the blob `id` into `out`, chunk by chunk
///
/// Returns the number of bytes written.
pub async fn get<W>(
    store: Arc<dyn DocumentStore>,
    id: &str,
    index: &str,
    parameters: ContentStreamParameters,
    out: &mut W,
) -> anyhow::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut reader = ContentStream::new(store, Some(id.to_string()), index)
        .with_parameters(parameters)
        .into_reader();

    while let Some(chunk) = reader.next().await {
        let chunk = chunk.with_context(|| format!("Failed to read blob {id}"))?;
        out.write_all(&chunk).await?;
    }
    out.flush().await?;

    Ok(reader.bytes_read())
}

/// Delete every chunk of the blob `id`
pub async fn remove(store: &dyn DocumentStore, id: &str, index: &str) -> anyhow::Result<u64> {
    let deleted = store
        .delete_by_query(index, &DeleteQuery::for_blob(id))
        .await
        .with_context(|| format!("Failed to delete blob {id}"))?;
    info!(id, deleted, "Blob removed");
    Ok(deleted)
}

/// List the chunks of the blob `id` in sequence order
///
/// Stops at the first missing chunk, the same place a reader would.
pub async fn inspect(
    store: &dyn DocumentStore,
    id: &str,
    index: &str,
) -> anyhow::Result<Vec<ChunkInfo>> {
    let mut chunks = Vec::new();
    let mut chunk_id = ChunkId::head(id);

    loop {
        let key = chunk_id.to_string();
        let Some(document) = store.get(index, &key).await? else {
            break;
        };

        chunks.push(ChunkInfo {
            data_len: document.data_len(),
            app_metadata: document.app_metadata,
            id: key,
        });
        chunk_id = chunk_id.next();
    }

    Ok(chunks)
}
