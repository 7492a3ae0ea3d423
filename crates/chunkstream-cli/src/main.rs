use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use chunkstream_cli::commands;
use chunkstream_cli::config::{Cli, Command};
use chunkstream_core::BlobAttributes;
use chunkstream_logging::ChunkstreamSubscriberBuilder;
use chunkstream_storage::{FileDocumentStore, FileStoreConfig};
use clap::Parser;
use tokio::io::{AsyncReadExt, AsyncWrite};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _guard = ChunkstreamSubscriberBuilder::new(cli.log_config()).try_init()?;

    let store = Arc::new(FileDocumentStore::new(FileStoreConfig::new(&cli.store)).await?);

    match cli.command {
        Command::Put {
            id,
            file,
            target,
            chunking,
            attributes,
        } => {
            let data = read_input(&file).await?;
            let id = (id != "-").then_some(id);
            let attributes: BlobAttributes = attributes.into_iter().collect();

            let summary = commands::put(
                store,
                id,
                &target.index,
                chunking.parameters(),
                attributes,
                &data,
            )
            .await?;
            println!(
                "{} ({} bytes in {} chunks)",
                summary.id, summary.bytes_written, summary.chunks_written
            );
        }

        Command::Get {
            id,
            target,
            chunking,
            size,
            out,
        } => {
            let mut parameters = chunking.parameters();
            parameters.size = size;

            let mut writer: Box<dyn AsyncWrite + Unpin + Send> = match &out {
                Some(path) => Box::new(
                    tokio::fs::File::create(path)
                        .await
                        .with_context(|| format!("Failed to create {}", path.display()))?,
                ),
                None => Box::new(tokio::io::stdout()),
            };

            let bytes = commands::get(store, &id, &target.index, parameters, &mut writer).await?;
            if let Some(path) = out {
                println!("Wrote {bytes} bytes to {}", path.display());
            }
        }

        Command::Rm { id, target } => {
            let deleted = commands::remove(store.as_ref(), &id, &target.index).await?;
            println!("Deleted {deleted} chunks");
        }

        Command::Inspect { id, target } => {
            let chunks = commands::inspect(store.as_ref(), &id, &target.index).await?;
            if chunks.is_empty() {
                println!("No chunks for {id}");
            }
            for chunk in chunks {
                match chunk.app_metadata {
                    Some(metadata) => println!(
                        "{}\t{}\t{}",
                        chunk.id,
                        chunk.data_len,
                        serde_json::Value::Object(metadata)
                    ),
                    None => println!("{}\t{}", chunk.id, chunk.data_len),
                }
            }
        }
    }

    Ok(())
}

async fn read_input(file: &Path) -> anyhow::Result<Vec<u8>> {
    if file == Path::new("-") {
        let mut data = Vec::new();
        tokio::io::stdin().read_to_end(&mut data).await?;
        return Ok(data);
    }

    tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))
}
