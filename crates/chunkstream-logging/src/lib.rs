//! Logging setup for chunkstream
//!
//! Builds a `tracing` subscriber from a [`LogConfig`]: an `EnvFilter`
//! (RUST_LOG wins over the configured level), pretty or JSONL output on
//! stderr, and optional JSONL files with rotation.
//!
//! ```ignore
//! use chunkstream_logging::{ChunkstreamSubscriberBuilder, FileConfig, LogConfig, LogFormat};
//!
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Jsonl)
//!     .with_file(FileConfig::new("/var/log/chunkstream"));
//! let _guard = ChunkstreamSubscriberBuilder::new(config).try_init()?;
//! ```
//!
//! Keep the returned guard alive when file output is enabled; dropping it
//! flushes and stops the background writer.

pub mod config;

pub use config::{FileConfig, JsonlConfig, LogConfig, LogFormat, Rotation};
pub use tracing_appender::non_blocking::WorkerGuard;

use std::fs;

use thiserror::Error;
use tracing::Subscriber;
use tracing_appender::non_blocking::NonBlocking;
use tracing_appender::rolling::{self, InitError, RollingFileAppender};
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Registry};

/// Errors raised while setting up logging
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(#[from] ParseError),

    #[error("Log directory error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Log file error: {0}")]
    Appender(#[from] InitError),

    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Turns a [`LogConfig`] into an installed subscriber
pub struct ChunkstreamSubscriberBuilder {
    config: LogConfig,
}

impl ChunkstreamSubscriberBuilder {
    pub fn new(config: LogConfig) -> Self {
        Self { config }
    }

    /// Build the subscriber without installing it
    ///
    /// The guard is `Some` when file output is enabled.
    pub fn build(
        self,
    ) -> Result<(impl Subscriber + Send + Sync + 'static, Option<WorkerGuard>), LoggingError> {
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&self.config.level)?,
        };
        let jsonl = self.config.jsonl;

        let (pretty, json) = match self.config.format {
            LogFormat::Pretty => (
                Some(fmt::layer().with_writer(std::io::stderr).with_target(true)),
                None,
            ),
            LogFormat::Jsonl => (None, Some(json_layer(&jsonl, std::io::stderr))),
        };

        let (file_layer, guard) = match &self.config.file {
            Some(file_config) => {
                let (writer, guard) = file_writer(file_config)?;
                (Some(json_layer(&jsonl, writer)), Some(guard))
            }
            None => (None, None),
        };

        let subscriber = Registry::default()
            .with(filter)
            .with(pretty)
            .with(json)
            .with(file_layer);

        Ok((subscriber, guard))
    }

    /// Install the subscriber globally
    ///
    /// Fails if a global subscriber has already been set.
    pub fn try_init(self) -> Result<Option<WorkerGuard>, LoggingError> {
        let (subscriber, guard) = self.build()?;
        tracing::subscriber::set_global_default(subscriber)?;
        Ok(guard)
    }
}

fn json_layer<S, W>(jsonl: &JsonlConfig, writer: W) -> impl Layer<S> + Send + Sync + 'static + use<S, W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .json()
        .with_current_span(jsonl.include_spans)
        .with_span_list(jsonl.include_spans)
        .flatten_event(jsonl.flatten_events)
        .with_file(jsonl.include_location)
        .with_line_number(jsonl.include_location)
        .with_writer(writer)
}

fn file_writer(config: &FileConfig) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    fs::create_dir_all(&config.directory)?;

    let rotation = match config.rotation {
        Rotation::Daily => rolling::Rotation::DAILY,
        Rotation::Hourly => rolling::Rotation::HOURLY,
        Rotation::Never => rolling::Rotation::NEVER,
    };

    let mut builder = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(config.prefix.as_str())
        .filename_suffix("log");
    if let Some(max_files) = config.max_files {
        builder = builder.max_log_files(max_files);
    }

    let appender = builder.build(&config.directory)?;
    Ok(tracing_appender::non_blocking(appender))
}
