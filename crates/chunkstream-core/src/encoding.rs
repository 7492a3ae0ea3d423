//! Chunk payload encodings
//!
//! The encoding decides both how a chunk's bytes are stored in the `data`
//! field and how many payload bytes fit in one chunk document.

use std::fmt::Display;
use std::str::FromStr;

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::byte_size::ByteSize;
use crate::error::CoreError;

/// Bytes reserved in every index request for everything except `data`
pub const REQUEST_SPAN_SIZE_IN_BYTES: u64 = 1024;

/// How chunk payloads are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentEncoding {
    /// Payload stored as-is (must be UTF-8 text)
    Raw,
    /// Payload stored as standard base64 (default)
    #[default]
    Base64,
}

impl ContentEncoding {
    /// Whether payloads are base64 encoded
    pub fn is_base64(&self) -> bool {
        matches!(self, ContentEncoding::Base64)
    }

    /// Maximum number of payload bytes per chunk for a request size limit
    ///
    /// The request overhead is subtracted first. Base64 turns every 3 bytes
    /// into 4 characters, so the payload is rounded down to whole 3-byte
    /// groups. Raw payloads get half of the remaining room. Never below 1.
    ///
    /// Raw chunks are split on character boundaries, so this is a target
    /// rather than a hard cap: a character wider than the segment (below
    /// `1030B` for a 3-byte character) is stored whole in its own chunk.
    pub fn max_segment_len(&self, max_chunk_size: ByteSize) -> usize {
        let available = max_chunk_size
            .as_u64()
            .saturating_sub(REQUEST_SPAN_SIZE_IN_BYTES);

        let len = match self {
            ContentEncoding::Base64 => available / 4 * 3,
            ContentEncoding::Raw => available / 2,
        };

        usize::try_from(len.max(1)).unwrap_or(usize::MAX)
    }

    /// Encode a payload segment as standard base64
    pub fn encode_base64(data: &[u8]) -> String {
        STANDARD.encode(data)
    }

    /// Decode the `data` field of a stored chunk
    pub fn decode(&self, data: &str) -> Result<Vec<u8>, base64::DecodeError> {
        match self {
            ContentEncoding::Raw => Ok(data.as_bytes().to_vec()),
            ContentEncoding::Base64 => STANDARD.decode(data),
        }
    }
}

impl Display for ContentEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentEncoding::Raw => write!(f, "raw"),
            ContentEncoding::Base64 => write!(f, "base64"),
        }
    }
}

impl FromStr for ContentEncoding {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" => Ok(ContentEncoding::Raw),
            "base64" => Ok(ContentEncoding::Base64),
            _ => Err(CoreError::deserialization(format!(
                "unknown content encoding: {s}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_len_for_small_limit() {
        let limit: ByteSize = "1028B".parse().unwrap();
        assert_eq!(ContentEncoding::Raw.max_segment_len(limit), 2);
        assert_eq!(ContentEncoding::Base64.max_segment_len(limit), 3);
    }

    #[test]
    fn test_segment_len_for_default_limit() {
        let limit = ByteSize::mb(4);
        let available = 4 * 1024 * 1024 - 1024;
        assert_eq!(ContentEncoding::Raw.max_segment_len(limit), available / 2);
        assert_eq!(
            ContentEncoding::Base64.max_segment_len(limit),
            available / 4 * 3
        );
    }

    #[test]
    fn test_base64_segment_fits_limit() {
        for bytes in [1025u64, 1028, 1029, 1030, 1031, 1032, 2048, 5000] {
            let limit = ByteSize::from_bytes(bytes);
            let len = ContentEncoding::Base64.max_segment_len(limit);
            let encoded = ContentEncoding::encode_base64(&vec![0xAB; len]);
            assert!(
                encoded.len() as u64 <= (bytes - REQUEST_SPAN_SIZE_IN_BYTES).max(4),
                "limit {bytes}: {} encoded chars",
                encoded.len()
            );
        }
    }

    #[test]
    fn test_segment_len_never_zero() {
        let limit = ByteSize::from_bytes(10);
        assert_eq!(ContentEncoding::Raw.max_segment_len(limit), 1);
        assert_eq!(ContentEncoding::Base64.max_segment_len(limit), 1);
    }

    #[test]
    fn test_decode() {
        assert_eq!(ContentEncoding::Raw.decode("12").unwrap(), b"12");
        assert_eq!(
            ContentEncoding::Base64.decode("ZW5jb2RlZCBjb250ZW50").unwrap(),
            b"encoded content"
        );
        assert!(ContentEncoding::Base64.decode("not base64!").is_err());
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("raw".parse::<ContentEncoding>().unwrap(), ContentEncoding::Raw);
        assert_eq!(
            "BASE64".parse::<ContentEncoding>().unwrap(),
            ContentEncoding::Base64
        );
        assert!("hex".parse::<ContentEncoding>().is_err());
        assert_eq!(ContentEncoding::default().to_string(), "base64");
    }
}
