//! File-backed document store
//!
//! Every document is a JSON file at `<base_dir>/<index>/<id>.json`.
//! Writes go to a temporary file that is renamed into place, so a reader
//! never observes a half-written chunk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chunkstream_core::{ChunkDocument, CoreError, DeleteQuery, DocumentStore};
use serde::{Deserialize, Serialize};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

const DOCUMENT_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "tmp";

/// Configuration for the file document store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileStoreConfig {
    /// Base directory; one subdirectory per index
    pub base_dir: PathBuf,
    /// Fsync every document before renaming it into place
    pub sync_writes: bool,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("./data/chunks"),
            sync_writes: true,
        }
    }
}

impl FileStoreConfig {
    /// Config rooted at `base_dir` with default options
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Default::default()
        }
    }
}

/// DocumentStore keeping one JSON file per document
#[derive(Debug)]
pub struct FileDocumentStore {
    config: FileStoreConfig,
}

impl FileDocumentStore {
    /// Open (and create if needed) a store
    pub async fn new(config: FileStoreConfig) -> Result<Self, CoreError> {
        fs::create_dir_all(&config.base_dir).await?;

        let store = Self { config };
        let removed = store.remove_stale_temp_files().await?;
        if removed > 0 {
            warn!(removed, "Removed temp files left by an interrupted write");
        }

        info!(path = %store.config.base_dir.display(), "File document store initialized");

        Ok(store)
    }

    /// The store's base directory
    pub fn base_dir(&self) -> &Path {
        &self.config.base_dir
    }

    /// All document ids in an index, sorted
    pub async fn ids(&self, index: &str) -> Result<Vec<String>, CoreError> {
        let dir = self.index_dir(index)?;
        let mut ids = Vec::new();

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ids),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            if let Some(id) = document_id(&entry.path()) {
                ids.push(id);
            }
        }

        ids.sort();
        Ok(ids)
    }

    fn index_dir(&self, index: &str) -> Result<PathBuf, CoreError> {
        validate_name(index)?;
        Ok(self.config.base_dir.join(index))
    }

    fn document_path(&self, index: &str, id: &str) -> Result<PathBuf, CoreError> {
        validate_name(id)?;
        Ok(self
            .index_dir(index)?
            .join(format!("{id}.{DOCUMENT_EXTENSION}")))
    }

    /// Write to a uniquely named temp file, then rename it over `path`
    async fn write_atomically(&self, path: &Path, contents: &[u8]) -> Result<(), CoreError> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| CoreError::invalid_name(path.display().to_string()))?;
        let suffix = Uuid::new_v4().simple();
        let temp_path = path.with_file_name(format!("{file_name}.{suffix}.{TEMP_EXTENSION}"));

        let result = async {
            let mut file = File::create(&temp_path).await?;
            file.write_all(contents).await?;
            if self.config.sync_writes {
                file.sync_all().await?;
            }
            drop(file);
            fs::rename(&temp_path, path).await
        }
        .await;

        if let Err(e) = result {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }

    /// Delete temp files under every index directory
    async fn remove_stale_temp_files(&self) -> Result<usize, CoreError> {
        let mut removed = 0;
        let mut indices = fs::read_dir(&self.config.base_dir).await?;

        while let Some(index_dir) = indices.next_entry().await? {
            if !index_dir.file_type().await?.is_dir() {
                continue;
            }

            let mut entries = fs::read_dir(index_dir.path()).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if path.extension().and_then(|ext| ext.to_str()) != Some(TEMP_EXTENSION) {
                    continue;
                }
                match fs::remove_file(&path).await {
                    Ok(()) => removed += 1,
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }

        Ok(removed)
    }

    async fn read_document(path: &Path) -> Result<Option<ChunkDocument>, CoreError> {
        let contents = match fs::read(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&contents)
            .map(Some)
            .map_err(|e| CoreError::deserialization(format!("{}: {e}", path.display())))
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    #[instrument(skip(self))]
    async fn get(&self, index: &str, id: &str) -> Result<Option<ChunkDocument>, CoreError> {
        let path = self.document_path(index, id)?;
        Self::read_document(&path).await
    }

    #[instrument(skip(self, document), fields(bytes = document.data_len()))]
    async fn index(
        &self,
        index: &str,
        id: &str,
        document: ChunkDocument,
    ) -> Result<(), CoreError> {
        let path = self.document_path(index, id)?;
        let contents =
            serde_json::to_vec(&document).map_err(|e| CoreError::serialization(e.to_string()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        self.write_atomically(&path, &contents).await?;

        debug!("Stored document");
        Ok(())
    }

    #[instrument(skip(self), fields(head = query.head_chunk_id()))]
    async fn delete_by_query(&self, index: &str, query: &DeleteQuery) -> Result<u64, CoreError> {
        let dir = self.index_dir(index)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut deleted = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Some(id) = document_id(&path) else {
                continue;
            };

            // Chunks named after the blob go without being read, so a
            // corrupt chunk cannot outlive a rewrite.
            if !query.covers_id(&id) {
                let Some(document) = Self::read_document(&path).await? else {
                    continue;
                };
                if !query.matches(&id, &document) {
                    continue;
                }
            }

            match fs::remove_file(&path).await {
                Ok(()) => deleted += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        debug!(deleted, "Deleted by query");
        Ok(deleted)
    }
}

/// Reject names that would escape the store directory
fn validate_name(name: &str) -> Result<(), CoreError> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
    {
        return Err(CoreError::invalid_name(name));
    }
    Ok(())
}

fn document_id(path: &Path) -> Option<String> {
    if path.extension().and_then(|ext| ext.to_str()) != Some(DOCUMENT_EXTENSION) {
        return None;
    }
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
}
