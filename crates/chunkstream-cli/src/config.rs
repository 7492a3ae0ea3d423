use std::path::PathBuf;

use chunkstream_core::{ByteSize, ContentEncoding};
use chunkstream_logging::{FileConfig, LogConfig, LogFormat, Rotation};
use chunkstream_storage::{ContentStreamParameters, DEFAULT_MAX_CHUNK_SIZE};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;

/// Index used when none is given
pub const DEFAULT_INDEX: &str = "chunks";

#[derive(Parser)]
#[command(name = "chunkstream", about = "Store and fetch chunked blobs")]
pub struct Cli {
    /// Root directory of the document store
    #[arg(long, global = true, env = "CHUNKSTREAM_STORE", default_value = "./data/chunks")]
    pub store: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// stderr log format (pretty, jsonl)
    #[arg(long, global = true, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Also write JSONL logs to rolling files in this directory
    #[arg(long, global = true, env = "CHUNKSTREAM_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// When to start a new log file (daily, hourly, never)
    #[arg(long, global = true, default_value_t = Rotation::Daily)]
    pub log_rotation: Rotation,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn log_config(&self) -> LogConfig {
        let config = LogConfig::new(self.log_level.as_str()).with_format(self.log_format);
        match &self.log_dir {
            Some(dir) => config.with_file(FileConfig::new(dir).with_rotation(self.log_rotation)),
            None => config,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a file as a blob, replacing any previous content
    Put {
        /// Blob id, or `-` to generate one
        id: String,
        /// Input file, or `-` for stdin
        file: PathBuf,
        #[command(flatten)]
        target: Target,
        #[command(flatten)]
        chunking: Chunking,
        /// Attribute stored on the head chunk, as `name=value`
        #[arg(long = "attr", value_parser = parse_attribute)]
        attributes: Vec<(String, Value)>,
    },
    /// Read a blob back
    Get {
        /// Blob id
        id: String,
        #[command(flatten)]
        target: Target,
        #[command(flatten)]
        chunking: Chunking,
        /// Expected size in bytes; reading stops once it is reached
        #[arg(long)]
        size: Option<u64>,
        /// Output file (defaults to stdout)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Delete every chunk of a blob
    Rm {
        /// Blob id
        id: String,
        #[command(flatten)]
        target: Target,
    },
    /// List the chunks of a blob
    Inspect {
        /// Blob id
        id: String,
        #[command(flatten)]
        target: Target,
    },
}

#[derive(Args, Debug, Clone)]
pub struct Target {
    /// Index holding the chunk documents
    #[arg(long, default_value = DEFAULT_INDEX)]
    pub index: String,
}

#[derive(Args, Debug, Clone)]
pub struct Chunking {
    /// Chunk payload encoding (raw, base64)
    #[arg(long, default_value_t = ContentEncoding::Base64)]
    pub encoding: ContentEncoding,
    /// Request size limit per chunk, e.g. `4mb` or `1028b`
    #[arg(long, default_value_t = DEFAULT_MAX_CHUNK_SIZE)]
    pub max_chunk_size: ByteSize,
}

impl Chunking {
    pub fn parameters(&self) -> ContentStreamParameters {
        ContentStreamParameters::default()
            .with_encoding(self.encoding)
            .with_max_chunk_size(self.max_chunk_size)
    }
}

/// Parse `name=value`; the value is read as JSON, falling back to a string
pub fn parse_attribute(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got `{raw}`"))?;

    if name.is_empty() {
        return Err("attribute name must not be empty".to_string());
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_attribute() {
        assert_eq!(
            parse_attribute("mime=text/plain").unwrap(),
            ("mime".to_string(), json!("text/plain"))
        );
        assert_eq!(
            parse_attribute("pages=12").unwrap(),
            ("pages".to_string(), json!(12))
        );
        assert_eq!(
            parse_attribute("note=a=b").unwrap(),
            ("note".to_string(), json!("a=b"))
        );
        assert!(parse_attribute("novalue").is_err());
        assert!(parse_attribute("=x").is_err());
    }

    #[test]
    fn test_put_arguments() {
        let cli = Cli::try_parse_from([
            "chunkstream",
            "--store",
            "/tmp/store",
            "put",
            "report",
            "report.pdf",
            "--encoding",
            "raw",
            "--max-chunk-size",
            "1028B",
            "--attr",
            "a=1",
            "--attr",
            "a=2",
        ])
        .unwrap();

        assert_eq!(cli.store, PathBuf::from("/tmp/store"));
        match cli.command {
            Command::Put {
                id,
                target,
                chunking,
                attributes,
                ..
            } => {
                assert_eq!(id, "report");
                assert_eq!(target.index, DEFAULT_INDEX);
                assert_eq!(chunking.encoding, ContentEncoding::Raw);
                assert_eq!(chunking.parameters().segment_len(), 2);
                assert_eq!(attributes.len(), 2);
            }
            _ => panic!("expected put"),
        }
    }

    #[test]
    fn test_log_config_defaults_to_pretty_stderr() {
        let cli = Cli::try_parse_from(["chunkstream", "rm", "report"]).unwrap();
        let config = cli.log_config();

        assert_eq!(config.level, "warn");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.file.is_none());
    }

    #[test]
    fn test_log_flags_build_file_output() {
        let cli = Cli::try_parse_from([
            "chunkstream",
            "inspect",
            "report",
            "--log-format",
            "jsonl",
            "--log-dir",
            "/var/log/chunkstream",
            "--log-rotation",
            "hourly",
        ])
        .unwrap();
        let config = cli.log_config();

        assert_eq!(config.format, LogFormat::Jsonl);
        let file = config.file.unwrap();
        assert_eq!(file.directory, PathBuf::from("/var/log/chunkstream"));
        assert_eq!(file.rotation, Rotation::Hourly);
    }

    #[test]
    fn test_unknown_log_format_is_rejected() {
        assert!(Cli::try_parse_from(["chunkstream", "--log-format", "xml", "rm", "x"]).is_err());
    }

    #[test]
    fn test_get_defaults() {
        let cli = Cli::try_parse_from(["chunkstream", "get", "report"]).unwrap();
        match cli.command {
            Command::Get {
                chunking, size, out, ..
            } => {
                assert_eq!(chunking.parameters(), ContentStreamParameters::default());
                assert!(size.is_none());
                assert!(out.is_none());
            }
            _ => panic!("expected get"),
        }
    }
}
