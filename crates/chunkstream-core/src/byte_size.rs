//! Human-readable byte sizes
//!
//! Accepts `<number><unit>` with units `b`, `kb`, `mb`, `gb` in any case
//! (binary multiples), or a bare number of bytes.

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

/// A byte count parsed from strings such as `1028B` or `4mb`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct ByteSize(u64);

impl ByteSize {
    /// Create from a number of bytes
    pub const fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    /// Create from kilobytes (1024 bytes)
    pub const fn kb(kb: u64) -> Self {
        Self(kb * KB)
    }

    /// Create from megabytes (1024 * 1024 bytes)
    pub const fn mb(mb: u64) -> Self {
        Self(mb * MB)
    }

    /// The size in bytes
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl FromStr for ByteSize {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let split = text
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(text.len());
        let (number, unit) = text.split_at(split);

        if number.is_empty() {
            return Err(CoreError::InvalidByteSize(s.to_string()));
        }

        let number: u64 = number
            .parse()
            .map_err(|_| CoreError::InvalidByteSize(s.to_string()))?;

        let multiplier = match unit.to_ascii_lowercase().as_str() {
            "" | "b" => 1,
            "kb" => KB,
            "mb" => MB,
            "gb" => GB,
            _ => return Err(CoreError::InvalidByteSize(s.to_string())),
        };

        number
            .checked_mul(multiplier)
            .map(Self)
            .ok_or_else(|| CoreError::InvalidByteSize(s.to_string()))
    }
}

impl Display for ByteSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bytes = self.0;
        if bytes != 0 && bytes % GB == 0 {
            write!(f, "{}gb", bytes / GB)
        } else if bytes != 0 && bytes % MB == 0 {
            write!(f, "{}mb", bytes / MB)
        } else if bytes != 0 && bytes % KB == 0 {
            write!(f, "{}kb", bytes / KB)
        } else {
            write!(f, "{}b", bytes)
        }
    }
}

impl TryFrom<String> for ByteSize {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ByteSize> for String {
    fn from(value: ByteSize) -> Self {
        value.to_string()
    }
}
